//! Unified error handling with consistent API response envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }

    /// Wrap an error in the envelope.
    pub fn error(code: &str, message: &str) -> Json<Self> {
        Json(Self {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status this error is reported with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Translate a failed write into `Conflict` when the database rejected it
    /// for a unique or foreign-key violation.
    pub fn from_write(err: sqlx::Error, conflict_message: impl Into<String>) -> Self {
        match err {
            sqlx::Error::Database(ref db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                AppError::Conflict(conflict_message.into())
            }
            _ => AppError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match &self {
            AppError::NotFound(msg) => ("NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => ("VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => ("CONFLICT", msg.clone()),
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                ("INTERNAL_ERROR", "An internal error occurred".to_string())
            }
        };

        let body = ApiResponse::<()> {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        };

        (status, Json(body)).into_response()
    }
}
