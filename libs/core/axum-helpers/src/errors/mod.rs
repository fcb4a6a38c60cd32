pub mod codes;
pub mod handlers;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body returned for every error response.
///
/// ```json
/// {
///   "message": "Validation failed",
///   "status": 400,
///   "timestamp": 1767225600000,
///   "errors": { "email": "Email must be valid" }
/// }
/// ```
///
/// `errors` is present only for field-level validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Field name to message, for validation failures
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, String>>,
}

impl ErrorResponse {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: BTreeMap<String, String>) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Application error type that can be converted to HTTP responses.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    /// Field errors produced outside the `validator` derive, e.g. query parameters.
    #[error("Invalid fields: {0:?}")]
    InvalidFields(BTreeMap<String, String>),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable Entity: {0}")]
    UnprocessableEntity(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

/// Flattens `validator` output into one message per field.
///
/// The first failing rule wins; a rule without a message falls back to its code.
pub fn field_messages(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first().map(|err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                (field.to_string(), message)
            })
        })
        .collect()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(
                    error_code = ErrorCode::JsonExtraction.code(),
                    "JSON extraction error: {:?}",
                    e
                );
                let status = match e {
                    JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, ErrorResponse::new(status, e.body_text()))
            }
            AppError::ValidationError(e) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    "Validation error: {:?}",
                    e
                );
                validation_failed(field_messages(&e))
            }
            AppError::InvalidFields(errors) => {
                tracing::info!(
                    error_code = ErrorCode::ValidationError.code(),
                    ?errors,
                    "Invalid request parameters"
                );
                validation_failed(errors)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error_code = ErrorCode::NotFound.code(), "Not found: {}", msg);
                let status = StatusCode::NOT_FOUND;
                (status, ErrorResponse::new(status, msg))
            }
            AppError::Conflict(msg) => {
                tracing::info!(error_code = ErrorCode::Conflict.code(), "Conflict: {}", msg);
                let status = StatusCode::CONFLICT;
                (status, ErrorResponse::new(status, msg))
            }
            AppError::UnprocessableEntity(msg) => {
                tracing::info!(
                    error_code = ErrorCode::UnprocessableEntity.code(),
                    "Unprocessable entity: {}",
                    msg
                );
                let status = StatusCode::UNPROCESSABLE_ENTITY;
                (status, ErrorResponse::new(status, msg))
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(
                    error_code = ErrorCode::InternalError.code(),
                    "Internal server error: {}",
                    msg
                );
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (
                    status,
                    ErrorResponse::new(status, ErrorCode::InternalError.default_message()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

fn validation_failed(errors: BTreeMap<String, String>) -> (StatusCode, ErrorResponse) {
    let status = StatusCode::BAD_REQUEST;
    (
        status,
        ErrorResponse::new(status, ErrorCode::ValidationError.default_message()).with_errors(errors),
    )
}
