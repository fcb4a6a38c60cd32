use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_parse_or, server::ServerConfig};
use database::common::RetryConfig;
use database::postgres::PostgresConfig;
use strum::{Display, EnumString};

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Where users are stored, chosen with `USERS_REPOSITORY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RepositoryBackend {
    #[default]
    InMemory,
    Postgres,
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub repository: RepositoryBackend,
    /// Loaded only for the postgres backend, which then requires `DATABASE_URL`
    pub database: Option<PostgresConfig>,
    pub retry: RetryConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // Uses defaults: HOST=0.0.0.0, PORT=8080
        let repository = env_parse_or("USERS_REPOSITORY", RepositoryBackend::default())?;

        let database = match repository {
            RepositoryBackend::Postgres => Some(PostgresConfig::from_env()?),
            RepositoryBackend::InMemory => None,
        };

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            repository,
            database,
            retry: RetryConfig::from_env()?,
        })
    }
}
