use crate::infra::{AppState, AssessmentService};
use assessment_engine::assessment::{
    AnswerSet, AssessmentId, AssessmentReport, KeyValueStore, PersistedAssessment, Polarity,
    QuestionnaireDefinition, ToolId,
};
use assessment_engine::error::AppError;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Serialize)]
pub(crate) struct ToolSummary {
    pub(crate) tool: ToolId,
    pub(crate) title: String,
    pub(crate) sections: usize,
    pub(crate) required_questions: usize,
    pub(crate) results_gate: Option<u8>,
    pub(crate) polarity: Polarity,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    #[serde(default)]
    pub(crate) answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) tool: ToolId,
    pub(crate) progress_percent: u8,
    #[serde(flatten)]
    pub(crate) report: AssessmentReport,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SaveRequest {
    #[serde(default)]
    pub(crate) title: Option<String>,
    #[serde(default)]
    pub(crate) answers: AnswerSet,
}

#[derive(Debug, Serialize)]
pub(crate) struct SaveResponse {
    pub(crate) id: AssessmentId,
    pub(crate) replaced: bool,
    pub(crate) evicted: Vec<AssessmentId>,
}

#[derive(Debug, Serialize)]
pub(crate) struct HistoryEntryView {
    pub(crate) id: AssessmentId,
    pub(crate) title: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) progress_percent: u8,
    pub(crate) overall_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) level: Option<String>,
}

impl From<&PersistedAssessment> for HistoryEntryView {
    fn from(record: &PersistedAssessment) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            created_at: record.created_at,
            progress_percent: record.progress_percent,
            overall_score: record.results.overall.score,
            level: record.results.overall.level().map(str::to_string),
        }
    }
}

/// Assessment routes plus the operational endpoints.
pub(crate) fn app_router<S>(service: Arc<AssessmentService<S>>) -> Router
where
    S: KeyValueStore + 'static,
{
    Router::new()
        .route("/api/v1/tools", get(list_tools::<S>))
        .route("/api/v1/tools/:tool", get(show_tool::<S>))
        .route(
            "/api/v1/tools/:tool/score",
            axum::routing::post(score_answers::<S>),
        )
        .route(
            "/api/v1/tools/:tool/history",
            get(list_history::<S>)
                .post(save_history::<S>)
                .delete(clear_history::<S>),
        )
        .route(
            "/api/v1/tools/:tool/history/:id",
            get(show_history_entry::<S>).delete(delete_history_entry::<S>),
        )
        .with_state(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn list_tools<S>(
    State(service): State<Arc<AssessmentService<S>>>,
) -> Json<Vec<ToolSummary>>
where
    S: KeyValueStore + 'static,
{
    let tools = service
        .catalog()
        .tools()
        .map(|questionnaire| ToolSummary {
            tool: questionnaire.tool().clone(),
            title: questionnaire.title().to_string(),
            sections: questionnaire.section_count(),
            required_questions: questionnaire.required_total(),
            results_gate: questionnaire.results_gate(),
            polarity: questionnaire.definition().scoring.bands.polarity,
        })
        .collect();
    Json(tools)
}

pub(crate) async fn show_tool<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(tool): Path<String>,
) -> Result<Json<QuestionnaireDefinition>, AppError>
where
    S: KeyValueStore + 'static,
{
    let questionnaire = service.questionnaire(&ToolId::from(tool))?;
    Ok(Json(questionnaire.definition().clone()))
}

pub(crate) async fn score_answers<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(tool): Path<String>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError>
where
    S: KeyValueStore + 'static,
{
    let questionnaire = service.questionnaire(&ToolId::from(tool))?;
    let answers = questionnaire.normalize_answers(request.answers)?;
    let report = questionnaire.evaluate(&answers);

    Ok(Json(ScoreResponse {
        tool: questionnaire.tool().clone(),
        progress_percent: questionnaire.progress_percent(&answers),
        report,
    }))
}

pub(crate) async fn list_history<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(tool): Path<String>,
) -> Result<Json<Vec<HistoryEntryView>>, AppError>
where
    S: KeyValueStore + 'static,
{
    let history = service.persistence(&ToolId::from(tool))?.history();
    Ok(Json(history.iter().map(HistoryEntryView::from).collect()))
}

pub(crate) async fn save_history<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(tool): Path<String>,
    Json(request): Json<SaveRequest>,
) -> Result<impl IntoResponse, AppError>
where
    S: KeyValueStore + 'static,
{
    let tool = ToolId::from(tool);
    let receipt = service.save_answers(&tool, request.answers, request.title, Utc::now())?;
    info!(%tool, id = %receipt.id, evicted = receipt.evicted.len(), "assessment saved via api");

    Ok((
        StatusCode::CREATED,
        Json(SaveResponse {
            id: receipt.id,
            replaced: receipt.replaced,
            evicted: receipt.evicted,
        }),
    ))
}

pub(crate) async fn clear_history<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path(tool): Path<String>,
) -> Result<Json<serde_json::Value>, AppError>
where
    S: KeyValueStore + 'static,
{
    let cleared = service.persistence(&ToolId::from(tool))?.clear()?;
    Ok(Json(json!({ "cleared": cleared })))
}

pub(crate) async fn show_history_entry<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path((tool, id)): Path<(String, String)>,
) -> Result<Json<PersistedAssessment>, AppError>
where
    S: KeyValueStore + 'static,
{
    let record = service.saved(&ToolId::from(tool), &AssessmentId::from(id))?;
    Ok(Json(record))
}

pub(crate) async fn delete_history_entry<S>(
    State(service): State<Arc<AssessmentService<S>>>,
    Path((tool, id)): Path<(String, String)>,
) -> Result<StatusCode, AppError>
where
    S: KeyValueStore + 'static,
{
    let id = AssessmentId::from(id);
    if service.persistence(&ToolId::from(tool))?.delete(&id)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("saved assessment '{id}'")))
    }
}
