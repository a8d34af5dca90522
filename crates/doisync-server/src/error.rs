//! HTTP error mapping

use crate::db::DbError;
use crate::doi::DoiError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors returned by the HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The registration service or the worker pool could not be reached
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error(transparent)]
    Doi(DoiError),
}

impl From<DoiError> for AppError {
    fn from(err: DoiError) -> Self {
        match err {
            DoiError::Store(e) => AppError::Db(e),
            other => AppError::Doi(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound(ref message) => (StatusCode::NOT_FOUND, message.clone()),
            AppError::BadRequest(ref message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Unavailable(ref message) => {
                tracing::warn!("Service unavailable: {}", message);
                (StatusCode::SERVICE_UNAVAILABLE, message.clone())
            },
            AppError::Internal(ref message) => {
                tracing::error!("Internal error: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message.clone())
            },
            AppError::Db(DbError::NotFound(ref message)) => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Db(DbError::Duplicate(ref message)) => (StatusCode::CONFLICT, message.clone()),
            AppError::Db(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "A database error occurred".to_string())
            },
            AppError::Doi(ref e) => match e {
                DoiError::InvalidMetadata { .. } => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
                DoiError::Unrecoverable { .. } | DoiError::SizeRejected { .. } => {
                    (StatusCode::BAD_GATEWAY, e.to_string())
                },
                DoiError::Transient { .. } | DoiError::Usages { .. } | DoiError::Queue { .. } => {
                    (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
                },
                DoiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            },
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}
