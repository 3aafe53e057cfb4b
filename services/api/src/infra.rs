use assessment_engine::assessment::{
    AnswerSet, AssessmentId, Catalog, KeyValueStore, PersistedAssessment, PersistenceManager,
    PersistenceSettings, Questionnaire, SaveReceipt, ToolId,
};
use assessment_engine::error::AppError;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Catalog lookups plus per-tool history access over one shared store.
pub(crate) struct AssessmentService<S> {
    catalog: Arc<Catalog>,
    store: Arc<S>,
    settings: PersistenceSettings,
}

impl<S> AssessmentService<S>
where
    S: KeyValueStore,
{
    pub(crate) fn new(catalog: Arc<Catalog>, store: Arc<S>, settings: PersistenceSettings) -> Self {
        Self {
            catalog,
            store,
            settings,
        }
    }

    pub(crate) fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub(crate) fn questionnaire(&self, tool: &ToolId) -> Result<&Arc<Questionnaire>, AppError> {
        self.catalog
            .get(tool)
            .ok_or_else(|| AppError::UnknownTool(tool.clone()))
    }

    pub(crate) fn persistence(&self, tool: &ToolId) -> Result<PersistenceManager<S>, AppError> {
        self.questionnaire(tool)?;
        Ok(PersistenceManager::new(
            Arc::clone(&self.store),
            tool.clone(),
            self.settings,
        ))
    }

    /// Validate raw answers against the tool and store them, with freshly
    /// computed results, as a new history entry.
    pub(crate) fn save_answers(
        &self,
        tool: &ToolId,
        answers: AnswerSet,
        title: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<SaveReceipt, AppError> {
        let questionnaire = self.questionnaire(tool)?;
        let answers = questionnaire.normalize_answers(answers)?;
        let persistence = self.persistence(tool)?;

        let record = PersistedAssessment {
            id: persistence.next_id(now)?,
            tool: tool.clone(),
            title: title.unwrap_or_else(|| {
                format!("{} {}", questionnaire.title(), now.format("%Y-%m-%d %H:%M"))
            }),
            created_at: now,
            results: questionnaire.score(&answers),
            progress_percent: questionnaire.progress_percent(&answers),
            answers,
        };
        Ok(persistence.save(&record)?)
    }

    pub(crate) fn saved(
        &self,
        tool: &ToolId,
        id: &AssessmentId,
    ) -> Result<PersistedAssessment, AppError> {
        self.persistence(tool)?
            .get(id)
            .ok_or_else(|| AppError::NotFound(format!("saved assessment '{id}'")))
    }
}

/// Built-in questionnaires, optionally extended by a JSON definition.
pub(crate) fn load_catalog(extra: Option<&Path>) -> Result<Catalog, AppError> {
    let mut catalog = Catalog::standard()?;
    if let Some(path) = extra {
        catalog.insert(load_questionnaire(path)?);
    }
    Ok(catalog)
}

pub(crate) fn load_questionnaire(path: &Path) -> Result<Questionnaire, AppError> {
    let file = File::open(path)?;
    Ok(Questionnaire::from_reader(BufReader::new(file))?)
}

pub(crate) fn load_answers(path: &Path) -> Result<AnswerSet, AppError> {
    let file = File::open(path)?;
    serde_json::from_reader(BufReader::new(file)).map_err(|err| {
        AppError::Input(format!(
            "failed to parse answers from {} ({err})",
            path.display()
        ))
    })
}
