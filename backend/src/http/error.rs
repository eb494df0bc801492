//! HTTP error handling and response types.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::ChampionshipError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Rejected by the championship rules or the store
    Championship(ChampionshipError),
    /// Body could not be parsed as the expected JSON payload
    BadRequest(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ApiError) {
        match self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError::new("BAD_REQUEST", msg),
            ),
            AppError::Championship(err) => match err {
                ChampionshipError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    ApiError::new("VALIDATION_ERROR", msg),
                ),
                ChampionshipError::NotFound(msg) => {
                    (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg))
                }
                ChampionshipError::Conflict { kind, message } => {
                    (StatusCode::CONFLICT, ApiError::new(kind.code(), message))
                }
                ChampionshipError::Repository(e) => {
                    let status = match e {
                        RepositoryError::ConnectionError { .. } => StatusCode::SERVICE_UNAVAILABLE,
                        _ => StatusCode::INTERNAL_SERVER_ERROR,
                    };
                    let mut body = ApiError::new("REPOSITORY_ERROR", e.to_string());
                    if let Some(op) = e.context().operation.as_deref() {
                        body = body.with_details(format!("operation: {}", op));
                    }
                    (status, body)
                }
                ChampionshipError::Report(msg) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("REPORT_ERROR", msg),
                ),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_body();
        if status.is_server_error() {
            tracing::error!(code = %error.code, "{}", error.message);
        }
        (status, Json(error)).into_response()
    }
}

impl From<ChampionshipError> for AppError {
    fn from(err: ChampionshipError) -> Self {
        AppError::Championship(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Championship(ChampionshipError::Repository(err))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
