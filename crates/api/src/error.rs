//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use seatwise_cache::error::CacheError;
use seatwise_core::error::CoreError;
use seatwise_db::error::{RepoError, PG_LOCK_NOT_AVAILABLE};

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Error type for all API handlers.
///
/// Converts domain and infrastructure errors into JSON responses with a
/// stable `code` field clients can branch on.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Core(e) => AppError::Core(e),
            RepoError::Database(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Core(core) => match core {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::NoAvailableSlots { .. } => {
                    (StatusCode::NOT_FOUND, "NO_AVAILABLE_SLOTS")
                }
                CoreError::NonConsecutiveSlots => {
                    (StatusCode::CONFLICT, "NON_CONSECUTIVE_SLOTS")
                }
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
                CoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CoreError::LockTimeout(_) => {
                    (StatusCode::SERVICE_UNAVAILABLE, "LOCK_TIMEOUT")
                }
                CoreError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
                }
            },
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::Cache(err) => match err {
                CacheError::Write(_) => (StatusCode::BAD_GATEWAY, "CACHE_WRITE_FAILED"),
                _ => (StatusCode::BAD_GATEWAY, "CACHE_UNAVAILABLE"),
            },
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

/// Map raw sqlx errors that escape the repository layer.
fn classify_sqlx_error(err: &sqlx::Error) -> (StatusCode, &'static str) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        sqlx::Error::Database(db) => match db.code().as_deref() {
            // Unique violation: a concurrent writer won the race.
            Some("23505") => (StatusCode::CONFLICT, "CONFLICT"),
            Some(PG_LOCK_NOT_AVAILABLE) => {
                (StatusCode::SERVICE_UNAVAILABLE, "LOCK_TIMEOUT")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE"),
        },
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed");
        } else {
            tracing::debug!(error = %self, code, "request rejected");
        }

        // 5xx messages are not echoed back; internals stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}
