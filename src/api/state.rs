//! Application state for shared services

use std::sync::Arc;

use crate::domain::user::UserRepository;
use crate::domain::{DomainError, NewUser, User, UserPatch};
use crate::infrastructure::user::{PasswordHasher, UserService};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<dyn UserServiceTrait>,
}

/// User operations reachable over HTTP
///
/// The credential lookup is intentionally absent: password hashes never
/// leave the process through the API.
#[async_trait::async_trait]
pub trait UserServiceTrait: Send + Sync {
    async fn create(&self, candidate: NewUser) -> Result<User, DomainError>;
    async fn find_one(&self, username: &str) -> Result<User, DomainError>;
    async fn find(&self) -> Result<Vec<User>, DomainError>;
    async fn count(&self) -> Result<u64, DomainError>;
    async fn update(&self, username: &str, patch: UserPatch) -> Result<User, DomainError>;
    async fn update_many(&self, usernames: &[String], patch: UserPatch)
    -> Result<u64, DomainError>;
    async fn delete_one(&self, username: &str) -> Result<(), DomainError>;
    async fn delete(&self, usernames: &[String]) -> Result<u64, DomainError>;
}

#[async_trait::async_trait]
impl<R, H> UserServiceTrait for UserService<R, H>
where
    R: UserRepository + 'static,
    H: PasswordHasher + 'static,
{
    async fn create(&self, candidate: NewUser) -> Result<User, DomainError> {
        UserService::create(self, candidate).await
    }

    async fn find_one(&self, username: &str) -> Result<User, DomainError> {
        UserService::find_one(self, username).await
    }

    async fn find(&self) -> Result<Vec<User>, DomainError> {
        UserService::find(self).await
    }

    async fn count(&self) -> Result<u64, DomainError> {
        UserService::count(self).await
    }

    async fn update(&self, username: &str, patch: UserPatch) -> Result<User, DomainError> {
        UserService::update(self, username, patch).await
    }

    async fn update_many(
        &self,
        usernames: &[String],
        patch: UserPatch,
    ) -> Result<u64, DomainError> {
        UserService::update_many(self, usernames, patch).await
    }

    async fn delete_one(&self, username: &str) -> Result<(), DomainError> {
        UserService::delete_one(self, username).await
    }

    async fn delete(&self, usernames: &[String]) -> Result<u64, DomainError> {
        UserService::delete(self, usernames).await
    }
}

impl AppState {
    /// Create new application state with provided services
    pub fn new(user_service: Arc<dyn UserServiceTrait>) -> Self {
        Self { user_service }
    }
}
