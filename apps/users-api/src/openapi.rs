use utoipa::OpenApi;

/// Main API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "0.1.0",
        description = "CRUD service for users identified by email"
    ),
    servers(
        (url = "/api", description = "API base path")
    ),
    nest(
        (path = crate::api::USERS_PATH, api = domain_users::ApiDoc)
    )
)]
pub struct ApiDoc;
