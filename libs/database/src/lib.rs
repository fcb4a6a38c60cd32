//! Database connectors and utilities.
//!
//! # Features
//!
//! - `postgres` (default): PostgreSQL via SeaORM
//! - `config`: `core_config::FromEnv` implementations for the connection settings
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::common::RetryConfig;
//! use database::postgres::{PostgresConfig, check_health, connect_from_config_with_retry};
//!
//! let db = connect_from_config_with_retry(PostgresConfig::from_env()?, Some(RetryConfig::from_env()?)).await?;
//! check_health(&db).await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use common::{DatabaseError, DatabaseResult};
