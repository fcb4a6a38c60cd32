use async_trait::async_trait;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::NullOrdering;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{UserError, UserResult},
    models::{Page, PageRequest, SortDirection, SortField, User},
    repository::{UserChange, UserRepository},
};

/// Serializes writers for the rest of the transaction; plain reads still pass.
const LOCK_USERS: &str = "LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE";

/// Users stored in the `users` table.
///
/// `create` and `update` hold [`LOCK_USERS`] inside one transaction, so their
/// existence checks cannot race with another writer.
#[derive(Clone)]
pub struct PgUserRepository {
    db: DatabaseConnection,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates the users table and its name index if they are missing.
    pub async fn create_schema(&self) -> UserResult<()> {
        for statement in entity::SCHEMA {
            self.db.execute_unprepared(statement).await?;
        }
        tracing::info!("Users schema ready");
        Ok(())
    }
}

fn roles_json(roles: &[String]) -> serde_json::Value {
    serde_json::Value::from(roles.to_vec())
}

fn order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

async fn find_model<C: ConnectionTrait>(
    conn: &C,
    email: &str,
) -> UserResult<Option<entity::Model>> {
    let model = entity::Entity::find()
        .filter(entity::Column::Email.eq(email))
        .one(conn)
        .await?;
    Ok(model)
}

async fn exists<C: ConnectionTrait>(
    conn: &C,
    column: entity::Column,
    value: &str,
) -> UserResult<bool> {
    let count = entity::Entity::find()
        .filter(column.eq(value))
        .count(conn)
        .await?;
    Ok(count > 0)
}

/// Writes name and roles of `user` over `model`; id and email stay.
async fn overwrite<C: ConnectionTrait>(
    conn: &C,
    model: entity::Model,
    user: User,
) -> UserResult<entity::Model> {
    let mut active: entity::ActiveModel = model.into();
    active.name = Set(user.name);
    active.roles = Set(roles_json(&user.roles));
    let model = active.update(conn).await?;
    tracing::info!(user_id = %model.id, "Updated user");
    Ok(model)
}

async fn insert<C: ConnectionTrait>(conn: &C, user: User) -> UserResult<entity::Model> {
    let model = entity::ActiveModel {
        id: Set(Uuid::now_v7()),
        name: Set(user.name),
        email: Set(user.email),
        roles: Set(roles_json(&user.roles)),
    }
    .insert(conn)
    .await?;
    tracing::info!(user_id = %model.id, email = ?model.email, "Created user");
    Ok(model)
}

async fn upsert<C: ConnectionTrait>(conn: &C, user: User) -> UserResult<entity::Model> {
    let existing = match &user.email {
        Some(email) => find_model(conn, email).await?,
        None => None,
    };

    match existing {
        Some(model) => overwrite(conn, model, user).await,
        None => insert(conn, user).await,
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn save(&self, user: User) -> UserResult<User> {
        let txn = self.db.begin().await?;
        let model = upsert(&txn, user).await?;
        txn.commit().await?;
        Ok(model.into())
    }

    async fn create(&self, user: User) -> UserResult<User> {
        let txn = self.db.begin().await?;
        txn.execute_unprepared(LOCK_USERS).await?;

        if let Some(name) = &user.name {
            if exists(&txn, entity::Column::Name, name).await? {
                return Err(UserError::DuplicateName(name.clone()));
            }
        }
        if let Some(email) = &user.email {
            if exists(&txn, entity::Column::Email, email).await? {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        let model = insert(&txn, user).await?;
        txn.commit().await?;
        Ok(model.into())
    }

    async fn update(&self, email: &str, change: UserChange) -> UserResult<User> {
        let txn = self.db.begin().await?;
        txn.execute_unprepared(LOCK_USERS).await?;

        let model = find_model(&txn, email)
            .await?
            .ok_or_else(|| UserError::NotFound(email.to_string()))?;

        let mut user = User::from(model.clone());
        change(&mut user)?;

        let model = overwrite(&txn, model, user).await?;
        txn.commit().await?;
        Ok(model.into())
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        Ok(find_model(&self.db, email).await?.map(Into::into))
    }

    async fn find_all(&self) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .order_by_asc(entity::Column::Id)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_all_paged(&self, request: &PageRequest) -> UserResult<Page<User>> {
        let total = entity::Entity::find().count(&self.db).await?;

        let direction = order(request.direction);
        let query = match request.sort_by {
            SortField::Id => entity::Entity::find().order_by(entity::Column::Id, direction),
            SortField::Name => entity::Entity::find()
                .order_by_with_nulls(entity::Column::Name, direction, NullOrdering::Last)
                .order_by_asc(entity::Column::Id),
            SortField::Email => entity::Entity::find()
                .order_by_with_nulls(entity::Column::Email, direction, NullOrdering::Last)
                .order_by_asc(entity::Column::Id),
        };

        let models = query
            .offset(request.offset())
            .limit(request.size)
            .all(&self.db)
            .await?;

        Ok(Page {
            content: models.into_iter().map(Into::into).collect(),
            total,
            request: *request,
        })
    }

    async fn delete_by_email(&self, email: &str) -> UserResult<bool> {
        let result = entity::Entity::delete_many()
            .filter(entity::Column::Email.eq(email))
            .exec(&self.db)
            .await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            tracing::info!(email, "Deleted user");
        }
        Ok(deleted)
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        exists(&self.db, entity::Column::Email, email).await
    }

    async fn exists_by_name(&self, name: &str) -> UserResult<bool> {
        exists(&self.db, entity::Column::Name, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase, MockExecResult, Value};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn model(name: &str) -> entity::Model {
        entity::Model {
            id: Uuid::now_v7(),
            name: Some(name.to_string()),
            email: Some(format!("{name}@example.com")),
            roles: json!(["user"]),
        }
    }

    #[tokio::test]
    async fn test_find_by_email_maps_model() {
        let jane = model("jane");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![jane.clone()]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let user = repo.find_by_email("jane@example.com").await.unwrap().unwrap();

        assert_eq!(user.id, jane.id);
        assert_eq!(user.roles, vec!["user"]);
    }

    #[tokio::test]
    async fn test_find_all_maps_every_row() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model("a"), model("b")]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let users = repo.find_all().await.unwrap();

        let names: Vec<_> = users.iter().filter_map(|u| u.name.as_deref()).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_save_inserts_unknown_email() {
        let jane = model("jane");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<entity::Model>::new(), vec![jane.clone()]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let saved = repo
            .save(User::new(jane.name.clone(), jane.email.clone(), vec!["user".into()]))
            .await
            .unwrap();

        assert_eq!(saved.id, jane.id);
    }

    fn count(n: i64) -> BTreeMap<&'static str, Value> {
        BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
    }

    fn lock_acquired() -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }
    }

    #[tokio::test]
    async fn test_create_checks_and_inserts_in_one_transaction() {
        let jane = model("jane");
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([lock_acquired()])
            .append_query_results([[count(0)], [count(0)]])
            .append_query_results([[jane.clone()]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let created = repo
            .create(User::new(jane.name.clone(), jane.email.clone(), vec!["user".into()]))
            .await
            .unwrap();

        assert_eq!(created.id, jane.id);
    }

    #[tokio::test]
    async fn test_create_with_taken_name_stops_before_email_check() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([lock_acquired()])
            .append_query_results([[count(1)]])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let err = repo
            .create(User::new(
                Some("jane".into()),
                Some("jane@example.com".into()),
                vec!["user".into()],
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::DuplicateName(name) if name == "jane"));
    }

    #[tokio::test]
    async fn test_update_unknown_email_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([lock_acquired()])
            .append_query_results([Vec::<entity::Model>::new()])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let err = repo
            .update("ghost@example.com", Box::new(|_: &mut User| Ok(())))
            .await
            .unwrap_err();

        assert!(matches!(err, UserError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_query_failure_is_internal() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())])
            .into_connection();
        let repo = PgUserRepository::new(db);

        let err = repo.find_by_email("jane@example.com").await.unwrap_err();
        assert!(matches!(err, UserError::Internal(_)));
    }
}
