use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_helpers::{ErrorResponse, ValidatedJson};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::UserResult;
use crate::models::{PageMetadata, PageParams, PageResponse, UserRequest, UserResponse};
use crate::repository::UserRepository;
use crate::service::UserService;

const TAG: &str = "users";

/// OpenAPI documentation for Users API
#[derive(OpenApi)]
#[openapi(
    paths(list_users, create_user, update_user, get_user, delete_user),
    components(schemas(
        UserRequest,
        UserResponse,
        PageResponse<UserResponse>,
        PageMetadata,
        ErrorResponse
    )),
    tags(
        (name = TAG, description = "User management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the user router with all HTTP endpoints
pub fn router<R: UserRepository + 'static>(service: UserService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/",
            get(list_users::<R>)
                .post(create_user::<R>)
                .put(update_user::<R>),
        )
        .route("/{email}", get(get_user::<R>).delete(delete_user::<R>))
        .with_state(shared_service)
}

/// List users, as a plain array or as one page when all paging parameters are given
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(PageParams),
    responses(
        (status = 200, description = "All users; a PageResponse envelope when paged", body = Vec<UserResponse>),
        (status = 400, description = "Invalid paging parameters", body = ErrorResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Query(params): Query<PageParams>,
) -> UserResult<Response> {
    match params.into_page_request()? {
        Some(request) => {
            let page = service.get_all_users_paged(request).await?;
            Ok(Json(page).into_response())
        }
        None => {
            let users = service.get_all_users().await?;
            Ok(Json(users).into_response())
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created successfully", body = UserResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 409, description = "Name or email already taken", body = ErrorResponse),
        (status = 422, description = "User has no roles", body = ErrorResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<UserRequest>,
) -> UserResult<impl IntoResponse> {
    let user = service.create_user(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Update name and roles of the user with the given email
#[utoipa::path(
    put,
    path = "",
    tag = TAG,
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated successfully", body = UserResponse),
        (status = 400, description = "Invalid request body", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "User has no roles", body = ErrorResponse)
    )
)]
async fn update_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    ValidatedJson(input): ValidatedJson<UserRequest>,
) -> UserResult<Json<UserResponse>> {
    let user = service.update_user(input).await?;
    Ok(Json(user))
}

/// Get a user by email
#[utoipa::path(
    get,
    path = "/{email}",
    tag = TAG,
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(email): Path<String>,
) -> UserResult<Json<UserResponse>> {
    let user = service.get_by_email(&email).await?;
    Ok(Json(user))
}

/// Delete a user by email
#[utoipa::path(
    delete,
    path = "/{email}",
    tag = TAG,
    params(
        ("email" = String, Path, description = "User email")
    ),
    responses(
        (status = 204, description = "User deleted successfully"),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
async fn delete_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    Path(email): Path<String>,
) -> UserResult<StatusCode> {
    service.delete_by_email(&email).await?;
    Ok(StatusCode::NO_CONTENT)
}
