/// Error types for Post Service
///
/// Every failure a handler can return is an `AppError`. Client errors carry the
/// exact body existing API consumers expect; server errors are logged and
/// rendered as a generic message without internal details.
use crate::validation::FieldErrors;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// Result type for post-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug, Error)]
pub enum AppError {
    /// Request fields failed validation (field name -> messages)
    #[error("Validation failed for: {}", .0.field_names().join(", "))]
    Validation(FieldErrors),

    /// Resource not found, rendered as `{status, message}`
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unresolvable id, rendered as `{message}`
    #[error("Unknown id: {0}")]
    UnknownId(String),

    /// Malformed request body
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Upload part exceeded the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Record store operation failed
    #[error("Database error: {0}")]
    Database(String),

    /// Blob store operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) | AppError::UnknownId(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        match self {
            AppError::Validation(errors) => HttpResponse::build(status).json(errors),
            AppError::UnknownId(message) => {
                HttpResponse::build(status).json(serde_json::json!({ "message": message }))
            }
            AppError::NotFound(message)
            | AppError::BadRequest(message)
            | AppError::PayloadTooLarge(message) => {
                HttpResponse::build(status).json(serde_json::json!({
                    "status": status.as_u16(),
                    "message": message,
                }))
            }
            AppError::Database(_) | AppError::Storage(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
                HttpResponse::build(status).json(serde_json::json!({
                    "status": status.as_u16(),
                    "message": "Server Error",
                }))
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
