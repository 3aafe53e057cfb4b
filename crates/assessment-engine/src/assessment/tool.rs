use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::model::{AnswerError, AnswerValue, AssessmentId, QuestionId};
use super::navigation::{AssessmentSession, NavigationError, NavigationState};
use super::persistence::{
    write_history_csv, DraftState, KeyValueStore, PersistedAssessment, PersistenceError,
    PersistenceManager, PersistenceSettings, SaveReceipt,
};
use super::questionnaire::{AssessmentReport, Questionnaire};

/// Last persistence outcome, for display next to the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    Saved { at: DateTime<Utc> },
    Failed { reason: String },
}

/// A history entry restored into the live session.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedAssessment {
    pub record: PersistedAssessment,
    /// Present when the restored answers satisfy the compute preconditions.
    pub report: Option<AssessmentReport>,
    /// Whether re-scoring reproduced the stored snapshot.
    pub snapshot_matches: bool,
}

/// One tool instance: a navigation session plus its persistence manager.
///
/// Persistence is best-effort throughout. Store failures are logged and
/// surfaced through [`SaveStatus`] but never stop answering, navigating, or
/// computing results.
pub struct AssessmentTool<S> {
    session: AssessmentSession,
    persistence: PersistenceManager<S>,
    saved_as: Option<(AssessmentId, DateTime<Utc>)>,
    status: Option<SaveStatus>,
}

impl<S> AssessmentTool<S>
where
    S: KeyValueStore,
{
    pub fn new(
        questionnaire: Arc<Questionnaire>,
        store: Arc<S>,
        settings: PersistenceSettings,
    ) -> Self {
        let persistence =
            PersistenceManager::new(store, questionnaire.tool().clone(), settings);
        Self {
            session: AssessmentSession::new(questionnaire),
            persistence,
            saved_as: None,
            status: None,
        }
    }

    pub fn session(&self) -> &AssessmentSession {
        &self.session
    }

    pub fn persistence(&self) -> &PersistenceManager<S> {
        &self.persistence
    }

    pub fn questionnaire(&self) -> &Arc<Questionnaire> {
        self.session.questionnaire()
    }

    pub fn save_status(&self) -> Option<&SaveStatus> {
        self.status.as_ref()
    }

    /// Restore the draft slot into the live session, if one exists.
    pub fn resume(&mut self) -> Option<DraftState> {
        let draft = self.persistence.load_draft()?;
        self.session.replace_answers(draft.answers.clone());
        info!(
            tool = %self.questionnaire().tool(),
            answers = self.session.answers().len(),
            "draft restored"
        );
        Some(draft)
    }

    pub fn answer(
        &mut self,
        question: &QuestionId,
        value: AnswerValue,
        now: DateTime<Utc>,
    ) -> Result<(), AnswerError> {
        self.session.set_answer(question, value)?;
        self.persistence.schedule_autosave(now);
        Ok(())
    }

    pub fn clear_answer(
        &mut self,
        question: &QuestionId,
        now: DateTime<Utc>,
    ) -> Result<bool, AnswerError> {
        let removed = self.session.clear_answer(question)?;
        if removed {
            self.persistence.schedule_autosave(now);
        }
        Ok(removed)
    }

    pub fn advance(&mut self) -> Result<NavigationState, NavigationError> {
        self.session.advance()
    }

    pub fn retreat(&mut self) -> Result<NavigationState, NavigationError> {
        self.session.retreat()
    }

    pub fn compute(&mut self) -> Result<&AssessmentReport, NavigationError> {
        self.session.compute()
    }

    /// Clear the session, drop any pending autosave, and discard the draft
    /// slot. History is untouched.
    pub fn restart(&mut self) {
        self.session.restart();
        self.persistence.cancel_autosave();
        self.saved_as = None;
        if let Err(err) = self.persistence.discard_draft() {
            warn!(error = %err, "failed to discard draft on restart");
            self.status = Some(SaveStatus::Failed {
                reason: err.to_string(),
            });
        }
    }

    /// Drive the autosave timer. Writes the draft when the quiet period has
    /// elapsed and reports the outcome.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<&SaveStatus> {
        let progress = self.session.progress_percent();
        match self
            .persistence
            .flush_autosave(now, self.session.answers(), progress)
        {
            Ok(Some(draft)) => {
                self.status = Some(SaveStatus::Saved {
                    at: draft.last_saved_at,
                });
            }
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "autosave failed");
                self.status = Some(SaveStatus::Failed {
                    reason: err.to_string(),
                });
            }
        }
        self.status.as_ref()
    }

    /// Snapshot the live answers and freshly computed scores into history.
    /// Saving again in the same session replaces the earlier entry; a first
    /// save always appends under an unused id.
    pub fn save_to_history(
        &mut self,
        now: DateTime<Utc>,
        title: Option<&str>,
    ) -> Result<SaveReceipt, PersistenceError> {
        let questionnaire = Arc::clone(self.session.questionnaire());
        let (id, created_at) = match self.saved_as.clone() {
            Some(saved) => saved,
            None => match self.persistence.next_id(now) {
                Ok(id) => (id, now),
                Err(err) => return Err(self.save_failed(None, err)),
            },
        };

        let record = PersistedAssessment {
            id: id.clone(),
            tool: questionnaire.tool().clone(),
            title: title.map(str::to_string).unwrap_or_else(|| {
                format!("{} {}", questionnaire.title(), now.format("%Y-%m-%d %H:%M"))
            }),
            created_at,
            answers: self.session.answers().clone(),
            results: questionnaire.score(self.session.answers()),
            progress_percent: self.session.progress_percent(),
        };

        match self.persistence.save(&record) {
            Ok(receipt) => {
                info!(%id, replaced = receipt.replaced, "assessment saved to history");
                self.saved_as = Some((id, created_at));
                self.status = Some(SaveStatus::Saved { at: now });
                Ok(receipt)
            }
            Err(err) => Err(self.save_failed(Some(&id), err)),
        }
    }

    fn save_failed(&mut self, id: Option<&AssessmentId>, err: PersistenceError) -> PersistenceError {
        warn!(id = ?id, error = %err, "failed to save assessment to history");
        self.status = Some(SaveStatus::Failed {
            reason: err.to_string(),
        });
        err
    }

    pub fn history(&self) -> Vec<PersistedAssessment> {
        self.persistence.history()
    }

    /// Replace the live answers with a saved entry and re-derive its results.
    pub fn load_from_history(
        &mut self,
        id: &AssessmentId,
        now: DateTime<Utc>,
    ) -> Option<LoadedAssessment> {
        let record = self.persistence.get(id)?;
        let questionnaire = Arc::clone(self.session.questionnaire());

        self.session.replace_answers(record.answers.clone());
        let rescored = questionnaire.score(self.session.answers());
        let snapshot_matches = rescored == record.results;
        if !snapshot_matches {
            warn!(%id, "stored results differ from re-scored answers");
        }

        let report = if self.session.can_compute() {
            self.session.compute().ok().cloned()
        } else {
            None
        };

        self.saved_as = Some((record.id.clone(), record.created_at));
        self.persistence.schedule_autosave(now);

        Some(LoadedAssessment {
            record,
            report,
            snapshot_matches,
        })
    }

    pub fn delete_from_history(&mut self, id: &AssessmentId) -> Result<bool, PersistenceError> {
        let removed = self.persistence.delete(id)?;
        if self
            .saved_as
            .as_ref()
            .is_some_and(|(saved, _)| saved == id)
        {
            self.saved_as = None;
        }
        Ok(removed)
    }

    pub fn clear_history(&mut self) -> Result<usize, PersistenceError> {
        self.saved_as = None;
        self.persistence.clear()
    }

    pub fn export_history_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        write_history_csv(&self.persistence.history(), writer)
    }
}
