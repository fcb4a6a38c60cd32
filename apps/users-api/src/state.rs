//! Shared application state.

/// Shared application state.
///
/// Cloned into the readiness handler and the shutdown cleanup task.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// PostgreSQL connection pool, present only for the postgres backend
    pub db: Option<database::postgres::DatabaseConnection>,
}
