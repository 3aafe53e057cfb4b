use std::collections::{BTreeMap, HashSet};
use std::io::Read;

use serde::{Deserialize, Serialize};

use super::model::{
    AnswerError, AnswerSet, AnswerValue, DimensionId, QuestionDefinition, QuestionId,
    QuestionKind, SectionDefinition, SectionId, ToolId,
};
use super::recommendations::{
    validate_rules, RecommendationGenerator, RecommendationItem, RecommendationRule,
};
use super::scoring::{ScoreResult, ScoringConfig, ScoringEngine};

/// Static per-tool configuration as authored (or loaded from JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionnaireDefinition {
    pub tool: ToolId,
    pub title: String,
    pub sections: Vec<SectionDefinition>,
    pub scoring: ScoringConfig,
    #[serde(default)]
    pub rules: Vec<RecommendationRule>,
    /// Minimum completion percentage before results may be computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_gate: Option<u8>,
}

/// Scores plus the recommendations derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub scores: ScoreResult,
    pub recommendations: Vec<RecommendationItem>,
}

/// A validated questionnaire. Construction fails loudly on any
/// configuration error, so a live instance always scores consistently.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    definition: QuestionnaireDefinition,
    index: BTreeMap<QuestionId, (usize, usize)>,
    engine: ScoringEngine,
    generator: RecommendationGenerator,
}

impl Questionnaire {
    pub fn new(mut definition: QuestionnaireDefinition) -> Result<Self, QuestionnaireError> {
        if definition.sections.is_empty() {
            return Err(QuestionnaireError::NoSections);
        }

        let mut section_ids = HashSet::new();
        let mut index = BTreeMap::new();
        for (section_index, section) in definition.sections.iter_mut().enumerate() {
            if !section_ids.insert(section.id.clone()) {
                return Err(QuestionnaireError::DuplicateSection(section.id.clone()));
            }
            if section.questions.is_empty() {
                return Err(QuestionnaireError::EmptySection(section.id.clone()));
            }
            for (question_index, question) in section.questions.iter_mut().enumerate() {
                question.section = section.id.clone();
                validate_question(question)?;
                if index
                    .insert(question.id.clone(), (section_index, question_index))
                    .is_some()
                {
                    return Err(QuestionnaireError::DuplicateQuestion(question.id.clone()));
                }
            }
        }

        if let Some(gate) = definition.results_gate.filter(|gate| *gate > 100) {
            return Err(QuestionnaireError::InvalidResultsGate(gate));
        }

        let lookup = |id: &QuestionId| {
            index
                .get(id)
                .map(|(section, question)| &definition.sections[*section].questions[*question])
        };
        definition.scoring.validate(lookup)?;

        validate_rules(
            &definition.rules,
            |dimension| {
                definition
                    .scoring
                    .dimensions
                    .iter()
                    .any(|candidate| &candidate.id == dimension)
            },
            |question| index.contains_key(question),
            |label| definition.scoring.bands.has_label(label),
        )?;

        let engine = ScoringEngine::new(definition.scoring.clone());
        let generator = RecommendationGenerator::new(definition.rules.clone());

        Ok(Self {
            definition,
            index,
            engine,
            generator,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, QuestionnaireError> {
        let definition: QuestionnaireDefinition = serde_json::from_str(raw)?;
        Self::new(definition)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, QuestionnaireError> {
        let definition: QuestionnaireDefinition = serde_json::from_reader(reader)?;
        Self::new(definition)
    }

    /// Read-only view for renderers.
    pub fn definition(&self) -> &QuestionnaireDefinition {
        &self.definition
    }

    pub fn tool(&self) -> &ToolId {
        &self.definition.tool
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn sections(&self) -> &[SectionDefinition] {
        &self.definition.sections
    }

    pub fn section(&self, index: usize) -> Option<&SectionDefinition> {
        self.definition.sections.get(index)
    }

    pub fn section_count(&self) -> usize {
        self.definition.sections.len()
    }

    pub fn results_gate(&self) -> Option<u8> {
        self.definition.results_gate
    }

    pub fn question(&self, id: &QuestionId) -> Option<&QuestionDefinition> {
        self.index
            .get(id)
            .map(|(section, question)| &self.definition.sections[*section].questions[*question])
    }

    pub fn has_dimension(&self, id: &DimensionId) -> bool {
        self.definition
            .scoring
            .dimensions
            .iter()
            .any(|dimension| &dimension.id == id)
    }

    pub fn scoring_engine(&self) -> &ScoringEngine {
        &self.engine
    }

    pub fn recommendation_generator(&self) -> &RecommendationGenerator {
        &self.generator
    }

    /// Validate one answer at the boundary. `Ok(None)` means "clear the key".
    pub fn normalize_answer(
        &self,
        id: &QuestionId,
        value: AnswerValue,
    ) -> Result<Option<AnswerValue>, AnswerError> {
        let question = self
            .question(id)
            .ok_or_else(|| AnswerError::UnknownQuestion(id.clone()))?;
        question.normalize(value)
    }

    /// Validate a whole externally supplied answer set.
    pub fn normalize_answers(&self, answers: AnswerSet) -> Result<AnswerSet, AnswerError> {
        let mut normalized = AnswerSet::new();
        for (id, value) in answers.iter() {
            if let Some(value) = self.normalize_answer(id, value.clone())? {
                normalized.insert(id.clone(), value);
            }
        }
        Ok(normalized)
    }

    /// Required questions in `section` that have no answer, in display order.
    pub fn missing_required(&self, section: usize, answers: &AnswerSet) -> Vec<QuestionId> {
        self.section(section)
            .map(|section| {
                section
                    .required_questions()
                    .filter(|question| !answers.is_answered(&question.id))
                    .map(|question| question.id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn required_total(&self) -> usize {
        self.definition
            .sections
            .iter()
            .map(|section| section.required_questions().count())
            .sum()
    }

    /// Answered required questions across all sections, as a rounded percentage.
    pub fn progress_percent(&self, answers: &AnswerSet) -> u8 {
        let total = self.required_total();
        if total == 0 {
            return 100;
        }
        let answered = self
            .definition
            .sections
            .iter()
            .flat_map(|section| section.required_questions())
            .filter(|question| answers.is_answered(&question.id))
            .count();
        ((answered as f64 / total as f64) * 100.0).round() as u8
    }

    pub fn score(&self, answers: &AnswerSet) -> ScoreResult {
        self.engine.score(answers)
    }

    /// Score and generate recommendations in one pass.
    pub fn evaluate(&self, answers: &AnswerSet) -> AssessmentReport {
        let scores = self.engine.score(answers);
        let recommendations = self.generator.generate(&scores, answers);
        AssessmentReport {
            scores,
            recommendations,
        }
    }
}

fn validate_question(question: &QuestionDefinition) -> Result<(), QuestionnaireError> {
    if question.kind.has_options() {
        if question.options.is_empty() {
            return Err(QuestionnaireError::MissingOptions(question.id.clone()));
        }
        let mut values = HashSet::new();
        for option in &question.options {
            if !values.insert(option.value.as_str()) {
                return Err(QuestionnaireError::DuplicateOption {
                    question: question.id.clone(),
                    value: option.value.clone(),
                });
            }
        }
    }

    match (question.kind, question.range) {
        (QuestionKind::Scale, None) => Err(QuestionnaireError::MissingRange(question.id.clone())),
        (_, Some(range)) if !range.is_valid() => {
            Err(QuestionnaireError::InvalidRange(question.id.clone()))
        }
        _ => Ok(()),
    }
}

/// Configuration errors. These are programming errors in a tool's static
/// configuration and abort initialization.
#[derive(Debug, thiserror::Error)]
pub enum QuestionnaireError {
    #[error("questionnaire has no sections")]
    NoSections,
    #[error("duplicate section id '{0}'")]
    DuplicateSection(SectionId),
    #[error("section '{0}' has no questions")]
    EmptySection(SectionId),
    #[error("duplicate question id '{0}'")]
    DuplicateQuestion(QuestionId),
    #[error("choice question '{0}' has no options")]
    MissingOptions(QuestionId),
    #[error("question '{question}' lists option '{value}' more than once")]
    DuplicateOption { question: QuestionId, value: String },
    #[error("scale question '{0}' needs a range")]
    MissingRange(QuestionId),
    #[error("question '{0}' has an invalid range")]
    InvalidRange(QuestionId),
    #[error("duplicate dimension id '{0}'")]
    DuplicateDimension(DimensionId),
    #[error("dimension '{0}' has no metrics")]
    EmptyDimension(DimensionId),
    #[error("dimension '{dimension}' has invalid weight {weight}")]
    InvalidWeight { dimension: DimensionId, weight: f64 },
    #[error("dimension '{dimension}' references unknown question '{question}'")]
    UnknownMetricQuestion {
        dimension: DimensionId,
        question: QuestionId,
    },
    #[error("score table cannot score {kind} question '{question}'")]
    IncompatibleTable {
        question: QuestionId,
        kind: QuestionKind,
    },
    #[error("score table for '{question}' does not cover option '{option}'")]
    UncoveredOption { question: QuestionId, option: String },
    #[error("score table for '{question}' adjusts unknown option '{option}'")]
    UnknownTallyOption { question: QuestionId, option: String },
    #[error("score table for '{question}' awards {points} points (max 100)")]
    InvalidPoints { question: QuestionId, points: u8 },
    #[error("bucket table for '{0}' must be non-empty with strictly increasing bounds")]
    InvalidBuckets(QuestionId),
    #[error("direct rating references unknown question '{0}'")]
    UnknownDirectRating(QuestionId),
    #[error("blend ratio {itemized}/{direct} must be non-negative and sum to 1")]
    InvalidBlend { itemized: f64, direct: f64 },
    #[error("classification band table is empty")]
    EmptyBands,
    #[error("first classification band must start at 0, found {0}")]
    BandsMustStartAtZero(u8),
    #[error("classification band bound {0} exceeds 100")]
    BandOutOfRange(u8),
    #[error("classification bands must increase strictly ({previous} then {next})")]
    NonMonotonicBands { previous: u8, next: u8 },
    #[error("duplicate recommendation rule id '{0}'")]
    DuplicateRule(String),
    #[error("rule '{rule}' references unknown dimension '{dimension}'")]
    UnknownRuleDimension { rule: String, dimension: DimensionId },
    #[error("rule '{rule}' references unknown question '{question}'")]
    UnknownRuleQuestion { rule: String, question: QuestionId },
    #[error("rule '{rule}' references unknown classification level '{label}'")]
    UnknownRuleLevel { rule: String, label: String },
    #[error("results gate {0}% exceeds 100")]
    InvalidResultsGate(u8),
    #[error("invalid questionnaire document: {0}")]
    Parse(#[from] serde_json::Error),
}
