//! Durable drafts and capped assessment history over a key/value store.
//!
//! Every read treats missing or malformed stored data as absent. Writes
//! surface `PersistenceError` for the caller to report, and a write that
//! cannot read the current index fails rather than rebuilding it.

mod debounce;
mod export;
mod store;

pub use debounce::Debouncer;
pub use export::write_history_csv;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreError};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::model::{AnswerSet, AssessmentId, ToolId};
use super::scoring::ScoreResult;
use crate::config::PersistenceConfig;

pub const DEFAULT_AUTOSAVE_MS: u64 = 1_500;
pub const DEFAULT_HISTORY_CAP: usize = 20;
const MAX_AUTOSAVE_MS: u64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceSettings {
    pub autosave_quiet: Duration,
    pub history_cap: usize,
}

impl Default for PersistenceSettings {
    fn default() -> Self {
        Self {
            autosave_quiet: Duration::milliseconds(DEFAULT_AUTOSAVE_MS as i64),
            history_cap: DEFAULT_HISTORY_CAP,
        }
    }
}

impl From<&PersistenceConfig> for PersistenceSettings {
    fn from(config: &PersistenceConfig) -> Self {
        Self {
            autosave_quiet: Duration::milliseconds(
                config.autosave_ms.min(MAX_AUTOSAVE_MS) as i64,
            ),
            history_cap: config.history_cap,
        }
    }
}

/// The single in-progress snapshot per tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftState {
    pub answers: AnswerSet,
    pub last_saved_at: DateTime<Utc>,
    pub progress_percent: u8,
}

/// An explicitly saved assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAssessment {
    pub id: AssessmentId,
    pub tool: ToolId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub answers: AnswerSet,
    pub results: ScoreResult,
    pub progress_percent: u8,
}

impl AssessmentId {
    /// Timestamp identity, e.g. `quality-metrics-1760000000000`.
    pub fn generate(tool: &ToolId, now: DateTime<Utc>) -> Self {
        Self(format!("{}-{}", tool, now.timestamp_millis()))
    }
}

/// Outcome of a history write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    pub id: AssessmentId,
    pub replaced: bool,
    pub evicted: Vec<AssessmentId>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode persisted data: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Owns the draft slot, the history collection, and the autosave timer for
/// one tool.
pub struct PersistenceManager<S> {
    store: Arc<S>,
    tool: ToolId,
    settings: PersistenceSettings,
    autosave: Debouncer,
}

impl<S> PersistenceManager<S>
where
    S: KeyValueStore,
{
    pub fn new(store: Arc<S>, tool: ToolId, settings: PersistenceSettings) -> Self {
        let autosave = Debouncer::new(settings.autosave_quiet);
        Self {
            store,
            tool,
            settings,
            autosave,
        }
    }

    pub fn tool(&self) -> &ToolId {
        &self.tool
    }

    pub fn settings(&self) -> PersistenceSettings {
        self.settings
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    fn draft_key(&self) -> String {
        format!("{}.draft", self.tool)
    }

    fn index_key(&self) -> String {
        format!("{}.history", self.tool)
    }

    fn entry_key(&self, id: &AssessmentId) -> String {
        format!("{}.history.{}", self.tool, id)
    }

    /// Note an answer mutation; any pending autosave is pushed back.
    pub fn schedule_autosave(&mut self, now: DateTime<Utc>) {
        if self.autosave.schedule(now) {
            debug!(tool = %self.tool, "pending autosave rescheduled");
        }
    }

    pub fn cancel_autosave(&mut self) -> bool {
        self.autosave.cancel()
    }

    pub fn autosave_pending(&self) -> bool {
        self.autosave.is_pending()
    }

    pub fn autosave_deadline(&self) -> Option<DateTime<Utc>> {
        self.autosave.deadline()
    }

    /// Write the draft if the quiet period has elapsed by `now`.
    pub fn flush_autosave(
        &mut self,
        now: DateTime<Utc>,
        answers: &AnswerSet,
        progress_percent: u8,
    ) -> Result<Option<DraftState>, PersistenceError> {
        if !self.autosave.fire_if_due(now) {
            return Ok(None);
        }
        let draft = DraftState {
            answers: answers.clone(),
            last_saved_at: now,
            progress_percent,
        };
        self.write_draft(&draft)?;
        debug!(tool = %self.tool, answers = draft.answers.len(), "draft autosaved");
        Ok(Some(draft))
    }

    pub fn write_draft(&self, draft: &DraftState) -> Result<(), PersistenceError> {
        let payload = serde_json::to_vec(draft)?;
        self.store.set(&self.draft_key(), &payload)?;
        Ok(())
    }

    pub fn load_draft(&self) -> Option<DraftState> {
        self.read_json(&self.draft_key())
    }

    pub fn discard_draft(&self) -> Result<(), PersistenceError> {
        self.store.delete(&self.draft_key())?;
        Ok(())
    }

    /// Insert or replace a history entry, evicting the oldest entries beyond
    /// the retention cap. A store failure reading the index aborts the write
    /// so existing entries are never dropped.
    pub fn save(&self, record: &PersistedAssessment) -> Result<SaveReceipt, PersistenceError> {
        let mut ids = self.index_for_write()?;
        let payload = serde_json::to_vec(record)?;
        self.store.set(&self.entry_key(&record.id), &payload)?;

        let replaced = ids.contains(&record.id);
        let mut evicted = Vec::new();
        let mut dangling = Vec::new();
        if !replaced {
            ids.insert(0, record.id.clone());
            if ids.len() > self.settings.history_cap {
                let (kept, unreadable): (Vec<_>, Vec<_>) = ids
                    .into_iter()
                    .partition(|id| id == &record.id || self.entry_readable(id));
                ids = kept;
                dangling = unreadable;
            }
            if ids.len() > self.settings.history_cap {
                evicted = ids.split_off(self.settings.history_cap);
            }
        }
        self.store
            .set(&self.index_key(), &serde_json::to_vec(&ids)?)?;

        for id in evicted.iter().chain(&dangling) {
            if let Err(err) = self.store.delete(&self.entry_key(id)) {
                warn!(tool = %self.tool, %id, error = %err, "failed to delete evicted assessment");
            }
        }
        if !dangling.is_empty() {
            warn!(tool = %self.tool, dropped = dangling.len(), "unreadable history ids dropped from index");
        }
        if !evicted.is_empty() {
            info!(tool = %self.tool, evicted = evicted.len(), "history retention cap enforced");
        }

        Ok(SaveReceipt {
            id: record.id.clone(),
            replaced,
            evicted,
        })
    }

    /// A fresh id for `now`, stepped forward a millisecond at a time past any
    /// id already listed or stored.
    pub fn next_id(&self, now: DateTime<Utc>) -> Result<AssessmentId, PersistenceError> {
        let listed = self.index_for_write()?;
        let mut stamp = now;
        loop {
            let id = AssessmentId::generate(&self.tool, stamp);
            if !listed.contains(&id) && self.store.get(&self.entry_key(&id))?.is_none() {
                return Ok(id);
            }
            stamp += Duration::milliseconds(1);
        }
    }

    /// Saved assessments, newest first. Entries that are missing or fail to
    /// parse are skipped.
    pub fn history(&self) -> Vec<PersistedAssessment> {
        self.load_index()
            .iter()
            .filter_map(|id| self.get(id))
            .collect()
    }

    pub fn get(&self, id: &AssessmentId) -> Option<PersistedAssessment> {
        self.read_json(&self.entry_key(id))
    }

    /// Remove a single entry. Returns whether it was listed.
    pub fn delete(&self, id: &AssessmentId) -> Result<bool, PersistenceError> {
        let mut ids = self.index_for_write()?;
        let before = ids.len();
        ids.retain(|candidate| candidate != id);
        let removed = ids.len() != before;
        if removed {
            self.store
                .set(&self.index_key(), &serde_json::to_vec(&ids)?)?;
        }
        self.store.delete(&self.entry_key(id))?;
        Ok(removed)
    }

    /// Remove every history entry. The draft slot is left alone.
    pub fn clear(&self) -> Result<usize, PersistenceError> {
        let ids = self.index_for_write()?;
        for id in &ids {
            self.store.delete(&self.entry_key(id))?;
        }
        self.store.delete(&self.index_key())?;
        info!(tool = %self.tool, cleared = ids.len(), "assessment history cleared");
        Ok(ids.len())
    }

    fn load_index(&self) -> Vec<AssessmentId> {
        self.read_json(&self.index_key()).unwrap_or_default()
    }

    /// The index as a writer sees it: absent or malformed starts a fresh
    /// list, a store error is returned untouched.
    fn index_for_write(&self) -> Result<Vec<AssessmentId>, PersistenceError> {
        let Some(bytes) = self.store.get(&self.index_key())? else {
            return Ok(Vec::new());
        };
        Ok(serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            warn!(tool = %self.tool, error = %err, "malformed history index replaced");
            Vec::new()
        }))
    }

    /// Unknown on a store error, so only entries known to be gone or broken
    /// report false.
    fn entry_readable(&self, id: &AssessmentId) -> bool {
        match self.store.get(&self.entry_key(id)) {
            Ok(Some(bytes)) => serde_json::from_slice::<PersistedAssessment>(&bytes).is_ok(),
            Ok(None) => false,
            Err(_) => true,
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.get(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(%key, error = %err, "store read failed; treating entry as absent");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(%key, error = %err, "malformed persisted entry ignored");
                None
            }
        }
    }
}
