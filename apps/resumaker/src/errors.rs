use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::editor::EditError;
use crate::identity::IdentityError;
use crate::remote::RemoteError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),
}

impl From<EditError> for AppError {
    fn from(e: EditError) -> Self {
        match e {
            EditError::UnknownEntry(_) => AppError::NotFound(e.to_string()),
            EditError::IndexOutOfRange(_) | EditError::UnknownSection(_) => {
                AppError::Validation(e.to_string())
            }
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(_: IdentityError) -> Self {
        AppError::Unauthorized
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Unauthorized
            | AppError::Remote(RemoteError::Unauthenticated(_))
            | AppError::Remote(RemoteError::Identity(_)) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Remote(RemoteError::NotFound(id)) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Resume {id} not found"),
            ),
            AppError::Remote(e) => {
                tracing::error!("Remote store error: {e}");
                (
                    StatusCode::BAD_GATEWAY,
                    "REMOTE_ERROR",
                    "The resume store could not be reached".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
