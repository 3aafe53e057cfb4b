use crate::assessment::{
    AnswerError, NavigationError, PersistenceError, QuestionnaireError, ToolId,
};
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Questionnaire(QuestionnaireError),
    Answer(AnswerError),
    Navigation(NavigationError),
    Persistence(PersistenceError),
    Export(csv::Error),
    UnknownTool(ToolId),
    NotFound(String),
    Input(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Questionnaire(err) => write!(f, "questionnaire error: {}", err),
            AppError::Answer(err) => write!(f, "invalid answer: {}", err),
            AppError::Navigation(err) => write!(f, "navigation rejected: {}", err),
            AppError::Persistence(err) => write!(f, "persistence error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::UnknownTool(tool) => write!(f, "unknown assessment tool '{}'", tool),
            AppError::NotFound(what) => write!(f, "{} not found", what),
            AppError::Input(message) => write!(f, "invalid input: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Questionnaire(err) => Some(err),
            AppError::Answer(err) => Some(err),
            AppError::Navigation(err) => Some(err),
            AppError::Persistence(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::UnknownTool(_) | AppError::NotFound(_) | AppError::Input(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UnknownTool(_) | AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Answer(_) | AppError::Input(_) | AppError::Questionnaire(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Navigation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Persistence(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let mut body = json!({ "error": self.to_string() });
        if let AppError::Navigation(err) = &self {
            if !err.missing().is_empty() {
                body["missing"] = json!(err.missing());
            }
        }
        (status, Json(body)).into_response()
    }
}

macro_rules! wrap_error {
    ($($source:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$source> for AppError {
                fn from(value: $source) -> Self {
                    Self::$variant(value)
                }
            }
        )+
    };
}

wrap_error!(
    ConfigError => Config,
    TelemetryError => Telemetry,
    std::io::Error => Io,
    axum::Error => Server,
    QuestionnaireError => Questionnaire,
    AnswerError => Answer,
    NavigationError => Navigation,
    PersistenceError => Persistence,
    csv::Error => Export,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{QuestionId, SectionId, StoreError};

    #[test]
    fn caller_mistakes_map_to_client_errors() {
        let unknown = AppError::UnknownTool(ToolId::from("sentiment")).into_response();
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let incomplete = AppError::from(NavigationError::Incomplete {
            section: SectionId::from("basics"),
            missing: vec![QuestionId::from("a")],
        })
        .into_response();
        assert_eq!(incomplete.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let answer = AppError::from(AnswerError::UnknownQuestion(QuestionId::from("zz")));
        assert_eq!(answer.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn storage_failures_are_service_unavailable() {
        let err = AppError::from(PersistenceError::from(StoreError::Unavailable(
            "disk detached".to_string(),
        )));
        assert!(err.to_string().contains("disk detached"));
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
