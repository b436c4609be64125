//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use skillctx_types::error::{LoadError, SkillNotFound};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    NotFound(SkillNotFound),
    /// A reload was rejected; the previous corpus is still active.
    Load(LoadError),
    Internal(String),
}

impl From<SkillNotFound> for AppError {
    fn from(e: SkillNotFound) -> Self {
        AppError::NotFound(e)
    }
}

impl From<LoadError> for AppError {
    fn from(e: LoadError) -> Self {
        AppError::Load(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            AppError::NotFound(SkillNotFound(id)) => {
                (StatusCode::NOT_FOUND, "SKILL_NOT_FOUND", Some(json!({ "id": id })))
            }
            AppError::Load(LoadError::DuplicateId { id, first, second }) => (
                StatusCode::CONFLICT,
                "DUPLICATE_SKILL_ID",
                Some(json!({ "id": id, "origins": [first, second] })),
            ),
            AppError::Load(LoadError::Malformed { origin, .. }) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "MALFORMED_SKILL",
                Some(json!({ "origin": origin })),
            ),
            AppError::Load(LoadError::Io { path, .. }) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CORPUS_IO_ERROR",
                Some(json!({ "path": path })),
            ),
            AppError::Load(LoadError::PhraseIndex { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INDEX_BUILD_ERROR", None)
            }
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::NotFound(e) => e.to_string(),
            AppError::Load(e) => e.to_string(),
            AppError::Internal(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, details) = self.parts();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "Request failed");
        } else {
            tracing::debug!(code, error = %message, "Request rejected");
        }

        ApiResponse::error(status, code, &message, details, uuid::Uuid::now_v7().to_string())
            .into_response()
    }
}
