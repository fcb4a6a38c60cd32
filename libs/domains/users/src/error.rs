use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use sea_orm::{DbErr, SqlErr};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User with username {0} already exists")]
    DuplicateName(String),

    #[error("User with email {0} already exists")]
    DuplicateEmail(String),

    #[error("User with email {0} not found")]
    NotFound(String),

    /// Entity-level rule violation, e.g. a user without roles.
    #[error("{0}")]
    InvalidRoles(&'static str),

    /// Paging parameters that failed to parse or were out of range, keyed by parameter.
    #[error("Invalid paging parameters: {0:?}")]
    InvalidPage(BTreeMap<String, String>),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<DbErr> for UserError {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                UserError::DuplicateEmail(extract_conflicting_value(&detail))
            }
            _ => UserError::Internal(format!("Database error: {}", err)),
        }
    }
}

/// Pulls `value` out of a Postgres detail like `Key (email)=(value) already exists.`
fn extract_conflicting_value(detail: &str) -> String {
    detail
        .split_once(")=(")
        .and_then(|(_, rest)| rest.split_once(')'))
        .map(|(value, _)| value.to_string())
        .unwrap_or_else(|| detail.to_string())
}

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateName(_) | UserError::DuplicateEmail(_) => {
                AppError::Conflict(err.to_string())
            }
            UserError::NotFound(_) => AppError::NotFound(err.to_string()),
            UserError::InvalidRoles(msg) => AppError::UnprocessableEntity(msg.to_string()),
            UserError::InvalidPage(errors) => AppError::InvalidFields(errors),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
