use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::{ErrorCode, ErrorResponse};

/// Fallback handler for unmatched routes.
pub async fn not_found() -> Response {
    let status = StatusCode::NOT_FOUND;
    let body = Json(ErrorResponse::new(status, ErrorCode::NotFound.default_message()));

    (status, body).into_response()
}
