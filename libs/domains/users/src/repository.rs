use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::{Page, PageRequest, SortField, User};

/// Edit applied to a loaded record inside [`UserRepository::update`].
pub type UserChange = Box<dyn FnOnce(&mut User) -> UserResult<()> + Send>;

/// Repository trait for User persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Upsert by email: an existing record with the same email gets the new
    /// name and roles, otherwise the user is inserted with a fresh id.
    async fn save(&self, user: User) -> UserResult<User>;

    /// Inserts `user` unless its name or its email is taken, name checked
    /// first. The checks and the insert form one unit of work.
    async fn create(&self, user: User) -> UserResult<User>;

    /// Loads the user with `email`, applies `change` and saves the result as
    /// one unit of work. An error from `change` leaves the record untouched.
    async fn update(&self, email: &str, change: UserChange) -> UserResult<User>;

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn find_all(&self) -> UserResult<Vec<User>>;

    /// One sorted page plus the total number of users
    async fn find_all_paged(&self, request: &PageRequest) -> UserResult<Page<User>>;

    /// Whether a record was removed; unknown emails are a no-op.
    async fn delete_by_email(&self, email: &str) -> UserResult<bool>;

    async fn exists_by_email(&self, email: &str) -> UserResult<bool>;

    async fn exists_by_name(&self, name: &str) -> UserResult<bool>;
}

#[derive(Debug, Default)]
struct Store {
    /// Insertion order
    users: Vec<User>,
    by_email: HashMap<String, Uuid>,
    by_name: HashMap<String, Uuid>,
}

impl Store {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.users.iter().position(|u| u.id == id)
    }

    fn find_by_email(&self, email: &str) -> Option<&User> {
        let id = self.by_email.get(email)?;
        self.users.iter().find(|u| u.id == *id)
    }

    /// A name already indexed for another record keeps pointing there.
    fn upsert(&mut self, user: User) -> User {
        let existing = user
            .email
            .as_deref()
            .and_then(|email| self.by_email.get(email).copied())
            .and_then(|id| self.position(id));

        if let Some(index) = existing {
            let record = &mut self.users[index];

            if record.name != user.name {
                if let Some(old) = record.name.take() {
                    if self.by_name.get(&old) == Some(&record.id) {
                        self.by_name.remove(&old);
                    }
                }
                if let Some(name) = &user.name {
                    self.by_name.entry(name.clone()).or_insert(record.id);
                }
            }

            record.name = user.name;
            record.roles = user.roles;

            tracing::info!(user_id = %record.id, "Updated user");
            return record.clone();
        }

        let user = User {
            id: Uuid::now_v7(),
            ..user
        };

        if let Some(email) = &user.email {
            self.by_email.insert(email.clone(), user.id);
        }
        if let Some(name) = &user.name {
            self.by_name.entry(name.clone()).or_insert(user.id);
        }
        self.users.push(user.clone());

        tracing::info!(user_id = %user.id, email = ?user.email, "Created user");
        user
    }
}

/// In-memory implementation of UserRepository (for development/testing)
///
/// Records live in one list; `by_email` and `by_name` map keys to ids so
/// existence checks avoid a scan. Null names and emails are not indexed.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Nulls sort after every value regardless of direction.
fn compare_nullable(a: Option<&str>, b: Option<&str>, request: &PageRequest) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => request.direction.apply(a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &User, b: &User, request: &PageRequest) -> Ordering {
    match request.sort_by {
        SortField::Name => compare_nullable(a.name.as_deref(), b.name.as_deref(), request),
        SortField::Email => compare_nullable(a.email.as_deref(), b.email.as_deref(), request),
        SortField::Id => request.direction.apply(a.id.cmp(&b.id)),
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: User) -> UserResult<User> {
        Ok(self.store.write().await.upsert(user))
    }

    async fn create(&self, user: User) -> UserResult<User> {
        let mut store = self.store.write().await;

        if let Some(name) = &user.name {
            if store.by_name.contains_key(name) {
                return Err(UserError::DuplicateName(name.clone()));
            }
        }
        if let Some(email) = &user.email {
            if store.by_email.contains_key(email) {
                return Err(UserError::DuplicateEmail(email.clone()));
            }
        }

        Ok(store.upsert(user))
    }

    async fn update(&self, email: &str, change: UserChange) -> UserResult<User> {
        let mut store = self.store.write().await;

        let mut user = store
            .find_by_email(email)
            .cloned()
            .ok_or_else(|| UserError::NotFound(email.to_string()))?;
        change(&mut user)?;

        Ok(store.upsert(user))
    }

    async fn find_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store.find_by_email(email).cloned())
    }

    async fn find_all(&self) -> UserResult<Vec<User>> {
        let store = self.store.read().await;
        Ok(store.users.clone())
    }

    async fn find_all_paged(&self, request: &PageRequest) -> UserResult<Page<User>> {
        let mut users = self.store.read().await.users.clone();

        // sort_by is stable, equal keys keep insertion order
        users.sort_by(|a, b| compare(a, b, request));

        let total = users.len() as u64;
        let content = users
            .into_iter()
            .skip(request.offset().min(total) as usize)
            .take(request.size as usize)
            .collect();

        Ok(Page {
            content,
            total,
            request: *request,
        })
    }

    async fn delete_by_email(&self, email: &str) -> UserResult<bool> {
        let mut store = self.store.write().await;

        let Some(id) = store.by_email.remove(email) else {
            return Ok(false);
        };

        if let Some(index) = store.position(id) {
            let user = store.users.remove(index);
            if let Some(name) = user.name {
                if store.by_name.get(&name) == Some(&id) {
                    store.by_name.remove(&name);
                }
            }
            tracing::info!(user_id = %id, "Deleted user");
        }

        Ok(true)
    }

    async fn exists_by_email(&self, email: &str) -> UserResult<bool> {
        let store = self.store.read().await;
        Ok(store.by_email.contains_key(email))
    }

    async fn exists_by_name(&self, name: &str) -> UserResult<bool> {
        let store = self.store.read().await;
        Ok(store.by_name.contains_key(name))
    }
}
