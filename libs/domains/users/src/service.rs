use std::sync::Arc;

use crate::error::{UserError, UserResult};
use crate::mapper;
use crate::models::{PageRequest, PageResponse, User, UserRequest, UserResponse};
use crate::repository::{UserChange, UserRepository};
use crate::validation;

/// Service layer for User business logic
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> Clone for UserService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Creates a user; the repository checks name then email uniqueness in
    /// the same unit of work as the insert.
    pub async fn create_user(&self, request: UserRequest) -> UserResult<UserResponse> {
        let user = mapper::to_user(request);
        validation::validate(Some(&user))?;

        let saved = self.repository.create(user).await?;
        Ok(mapper::to_response(saved))
    }

    /// Overwrites name and roles of the user identified by the request's email.
    pub async fn update_user(&self, request: UserRequest) -> UserResult<UserResponse> {
        let email = request.email.clone();
        let change: UserChange = Box::new(move |user: &mut User| {
            mapper::update_user(request, user);
            validation::validate(Some(&*user))
        });

        let saved = self.repository.update(&email, change).await?;
        Ok(mapper::to_response(saved))
    }

    pub async fn delete_by_email(&self, email: &str) -> UserResult<()> {
        if !self.repository.delete_by_email(email).await? {
            return Err(UserError::NotFound(email.to_string()));
        }
        Ok(())
    }

    pub async fn get_all_users(&self) -> UserResult<Vec<UserResponse>> {
        let users = self.repository.find_all().await?;
        Ok(users.into_iter().map(mapper::to_response).collect())
    }

    pub async fn get_all_users_paged(
        &self,
        request: PageRequest,
    ) -> UserResult<PageResponse<UserResponse>> {
        let page = self.repository.find_all_paged(&request).await?;
        Ok(page.map(mapper::to_response).into())
    }

    pub async fn get_by_email(&self, email: &str) -> UserResult<UserResponse> {
        self.repository
            .find_by_email(email)
            .await?
            .map(mapper::to_response)
            .ok_or_else(|| UserError::NotFound(email.to_string()))
    }
}
