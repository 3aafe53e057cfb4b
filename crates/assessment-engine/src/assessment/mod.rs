//! Structured self-assessment questionnaires: answer model, weighted scoring,
//! band classification, rule-based recommendations, section navigation, and
//! best-effort persistence of drafts and history.

pub mod catalog;
pub mod model;
pub mod navigation;
pub mod persistence;
pub mod questionnaire;
pub mod recommendations;
pub mod scoring;
pub mod tool;

#[cfg(test)]
mod tests;

pub use catalog::{
    Catalog, COMPLIANCE_CHECKLIST, QUALITY_METRICS, RISK_EVALUATION, USE_CASE_ASSESSMENT,
};
pub use model::{
    AnswerError, AnswerOption, AnswerSet, AnswerValue, AssessmentId, DimensionId, QuestionDefinition,
    QuestionId, QuestionKind, SectionDefinition, SectionId, ToolId, ValueRange,
};
pub use navigation::{AssessmentSession, NavigationError, NavigationState};
pub use persistence::{
    DraftState, FileStore, KeyValueStore, MemoryStore, PersistedAssessment, PersistenceError,
    PersistenceManager, PersistenceSettings, SaveReceipt, StoreError,
};
pub use questionnaire::{AssessmentReport, Questionnaire, QuestionnaireDefinition, QuestionnaireError};
pub use recommendations::{
    Condition, Priority, RecommendationGenerator, RecommendationItem, RecommendationRule,
};
pub use scoring::{
    Band, BandTable, BlendRatio, Classification, DimensionDefinition, DimensionScore,
    DirectRating, MetricDefinition, OverallResult, Polarity, ScoreBasis, ScoreResult,
    ScoreTable, ScoringConfig, ScoringEngine,
};
pub use tool::{AssessmentTool, LoadedAssessment, SaveStatus};
