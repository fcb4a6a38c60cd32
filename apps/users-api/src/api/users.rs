use axum::Router;
use domain_users::{InMemoryUserRepository, PgUserRepository, UserService, handlers};

/// Users routes backed by Postgres when a pool is configured, otherwise in memory.
pub fn router(state: &crate::state::AppState) -> Router {
    match &state.db {
        Some(db) => handlers::router(UserService::new(PgUserRepository::new(db.clone()))),
        None => handlers::router(UserService::new(InMemoryUserRepository::new())),
    }
}
