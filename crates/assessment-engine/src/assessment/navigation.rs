use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::model::{AnswerError, AnswerSet, AnswerValue, QuestionId, SectionDefinition, SectionId};
use super::questionnaire::{AssessmentReport, Questionnaire};

/// Position within a questionnaire: a section index or the terminal results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NavigationState {
    Section { index: usize },
    Results,
}

/// Rejected transitions. The session state is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("section '{section}' is missing required answers: {}", join_ids(.missing))]
    Incomplete {
        section: SectionId,
        missing: Vec<QuestionId>,
    },
    #[error("already at the first section")]
    AtFirstSection,
    #[error("section {index} is the last section; compute results instead")]
    NoFurtherSection { index: usize },
    #[error("results can only be computed from the last section (currently at {index})")]
    NotOnLastSection { index: usize },
    #[error("assessment is {progress}% complete; {gate}% required before computing results")]
    BelowResultsGate { progress: u8, gate: u8 },
    #[error("results already computed; restart to begin again")]
    ResultsReached,
}

fn join_ids(ids: &[QuestionId]) -> String {
    ids.iter()
        .map(QuestionId::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl NavigationError {
    /// Question ids that blocked the transition, if any.
    pub fn missing(&self) -> &[QuestionId] {
        match self {
            NavigationError::Incomplete { missing, .. } => missing,
            _ => &[],
        }
    }
}

/// Linear section-by-section walk through a questionnaire. Owns the live
/// answer set for the in-progress session.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    questionnaire: Arc<Questionnaire>,
    answers: AnswerSet,
    state: NavigationState,
    progress: u8,
    report: Option<AssessmentReport>,
}

impl AssessmentSession {
    pub fn new(questionnaire: Arc<Questionnaire>) -> Self {
        let answers = AnswerSet::new();
        let progress = questionnaire.progress_percent(&answers);
        Self {
            questionnaire,
            answers,
            state: NavigationState::Section { index: 0 },
            progress,
            report: None,
        }
    }

    pub fn questionnaire(&self) -> &Arc<Questionnaire> {
        &self.questionnaire
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn current_section(&self) -> Option<&SectionDefinition> {
        match self.state {
            NavigationState::Section { index } => self.questionnaire.section(index),
            NavigationState::Results => None,
        }
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress
    }

    /// The report computed on entering `Results`.
    pub fn report(&self) -> Option<&AssessmentReport> {
        self.report.as_ref()
    }

    pub fn set_answer(&mut self, question: &QuestionId, value: AnswerValue) -> Result<(), AnswerError> {
        if self.state == NavigationState::Results {
            return Err(AnswerError::SessionComplete);
        }
        match self.questionnaire.normalize_answer(question, value)? {
            Some(value) => {
                self.answers.insert(question.clone(), value);
            }
            None => {
                self.answers.remove(question);
            }
        }
        self.refresh_progress();
        Ok(())
    }

    /// Remove an answer. Returns whether one was present.
    pub fn clear_answer(&mut self, question: &QuestionId) -> Result<bool, AnswerError> {
        if self.state == NavigationState::Results {
            return Err(AnswerError::SessionComplete);
        }
        if self.questionnaire.question(question).is_none() {
            return Err(AnswerError::UnknownQuestion(question.clone()));
        }
        let removed = self.answers.remove(question).is_some();
        self.refresh_progress();
        Ok(removed)
    }

    /// Required questions of the current section still unanswered.
    pub fn missing_in_current_section(&self) -> Vec<QuestionId> {
        match self.state {
            NavigationState::Section { index } => {
                self.questionnaire.missing_required(index, &self.answers)
            }
            NavigationState::Results => Vec::new(),
        }
    }

    pub fn can_advance(&self) -> bool {
        match self.state {
            NavigationState::Section { index } => {
                index + 1 < self.questionnaire.section_count()
                    && self.missing_in_current_section().is_empty()
            }
            NavigationState::Results => false,
        }
    }

    pub fn can_compute(&self) -> bool {
        self.check_compute().is_ok()
    }

    pub fn advance(&mut self) -> Result<NavigationState, NavigationError> {
        let index = self.section_index()?;
        self.validate_section(index)?;
        if index + 1 >= self.questionnaire.section_count() {
            return Err(NavigationError::NoFurtherSection { index });
        }
        self.state = NavigationState::Section { index: index + 1 };
        self.refresh_progress();
        Ok(self.state)
    }

    pub fn retreat(&mut self) -> Result<NavigationState, NavigationError> {
        let index = self.section_index()?;
        if index == 0 {
            return Err(NavigationError::AtFirstSection);
        }
        self.state = NavigationState::Section { index: index - 1 };
        self.refresh_progress();
        Ok(self.state)
    }

    /// Score the answers and enter `Results`.
    pub fn compute(&mut self) -> Result<&AssessmentReport, NavigationError> {
        self.check_compute()?;

        let report = self.questionnaire.evaluate(&self.answers);
        info!(
            tool = %self.questionnaire.tool(),
            score = report.scores.overall.score,
            level = report.scores.overall.level().unwrap_or("unclassified"),
            recommendations = report.recommendations.len(),
            "assessment results computed"
        );
        self.state = NavigationState::Results;
        Ok(&*self.report.insert(report))
    }

    /// Clear the live answers and return to the first section.
    pub fn restart(&mut self) {
        self.answers.clear();
        self.report = None;
        self.state = NavigationState::Section { index: 0 };
        self.refresh_progress();
    }

    /// Replace the live answers wholesale (never merged). Invalid entries are
    /// dropped. The session lands on the first section with missing required
    /// answers, or the last section when every section is complete.
    pub fn replace_answers(&mut self, answers: AnswerSet) {
        let mut accepted = AnswerSet::new();
        for (question, value) in answers.iter() {
            match self.questionnaire.normalize_answer(question, value.clone()) {
                Ok(Some(value)) => {
                    accepted.insert(question.clone(), value);
                }
                Ok(None) => {}
                Err(err) => debug!(%question, error = %err, "dropping restored answer"),
            }
        }

        self.answers = accepted;
        self.report = None;
        let sections = self.questionnaire.section_count();
        let index = (0..sections)
            .find(|index| !self.questionnaire.missing_required(*index, &self.answers).is_empty())
            .unwrap_or(sections.saturating_sub(1));
        self.state = NavigationState::Section { index };
        self.refresh_progress();
    }

    fn check_compute(&self) -> Result<(), NavigationError> {
        let index = self.section_index()?;
        if index + 1 != self.questionnaire.section_count() {
            return Err(NavigationError::NotOnLastSection { index });
        }
        self.validate_section(index)?;
        if let Some(gate) = self.questionnaire.results_gate() {
            if self.progress < gate {
                return Err(NavigationError::BelowResultsGate {
                    progress: self.progress,
                    gate,
                });
            }
        }
        Ok(())
    }

    fn section_index(&self) -> Result<usize, NavigationError> {
        match self.state {
            NavigationState::Section { index } => Ok(index),
            NavigationState::Results => Err(NavigationError::ResultsReached),
        }
    }

    fn validate_section(&self, index: usize) -> Result<(), NavigationError> {
        let missing = self.questionnaire.missing_required(index, &self.answers);
        if missing.is_empty() {
            return Ok(());
        }
        let section = self
            .questionnaire
            .section(index)
            .map(|section| section.id.clone())
            .unwrap_or_else(|| SectionId::from(""));
        debug!(%section, missing = missing.len(), "section validation failed");
        Err(NavigationError::Incomplete { section, missing })
    }

    fn refresh_progress(&mut self) {
        self.progress = self.questionnaire.progress_percent(&self.answers);
    }
}
