use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::User;

/// Sea-ORM Entity for the users table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(column_type = "Text", nullable)]
    pub name: Option<String>,
    #[sea_orm(column_type = "Text", nullable, unique)]
    pub email: Option<String>,
    pub roles: Json, // JSONB array of strings
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        let roles: Vec<String> = serde_json::from_value(model.roles).unwrap_or_default();

        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            roles,
        }
    }
}

/// Idempotent schema bootstrap for the users table, one statement each.
pub const SCHEMA: [&str; 2] = [
    r#"CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    name TEXT,
    email TEXT UNIQUE,
    roles JSONB NOT NULL DEFAULT '[]'::jsonb
)"#,
    "CREATE INDEX IF NOT EXISTS idx_users_name ON users (name)",
];
