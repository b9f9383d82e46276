//! User service: create, read, update and delete user records

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::user::{
    validate_password, validate_username, NewUser, Projection, User, UserFilter, UserPatch,
    UserRepository,
};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// User service for record management
///
/// The store and hasher are injected at construction; the service holds no
/// other state.
#[derive(Debug)]
pub struct UserService<R: UserRepository, H: PasswordHasher> {
    repository: Arc<R>,
    hasher: Arc<H>,
}

impl<R: UserRepository, H: PasswordHasher> UserService<R, H> {
    /// Create a new user service
    pub fn new(repository: Arc<R>, hasher: Arc<H>) -> Self {
        Self { repository, hasher }
    }

    /// Create a new user
    ///
    /// The plaintext password is replaced by its hash before anything reaches
    /// the store. A taken username fails with `Duplicate` and nothing is
    /// written. The returned record carries no password.
    pub async fn create(&self, candidate: NewUser) -> Result<User, DomainError> {
        validate_username(&candidate.username)
            .map_err(|e| DomainError::validation(e.to_string()))?;
        validate_password(&candidate.password)
            .map_err(|e| DomainError::validation(e.to_string()))?;

        let password = self.hasher.hash(&candidate.password)?;
        let candidate = NewUser {
            password,
            ..candidate
        };
        let username = candidate.username.clone();

        match self.repository.insert(candidate).await {
            Ok(user) => {
                info!(username = %username, id = %user.id(), "User created");
                Ok(user.without_credential())
            }
            Err(e) if e.is_duplicate() => {
                warn!(username = %username, "Rejected duplicate username");
                Err(DomainError::duplicate(format!(
                    "User '{}' already exists",
                    username
                )))
            }
            Err(e) => Err(e),
        }
    }

    /// Get a user by username, without the password hash
    pub async fn find_one(&self, username: &str) -> Result<User, DomainError> {
        self.repository
            .find_one(username, Projection::Public)
            .await?
            .ok_or_else(|| not_found(username))
    }

    /// Get a user by username including the password hash
    ///
    /// Reserved for authentication; never expose the result over a listing.
    pub async fn find_one_with_credential(&self, username: &str) -> Result<User, DomainError> {
        self.repository
            .find_one(username, Projection::WithCredential)
            .await?
            .ok_or_else(|| not_found(username))
    }

    /// List every user. No pagination.
    pub async fn find(&self) -> Result<Vec<User>, DomainError> {
        self.repository.find_many(&UserFilter::All).await
    }

    /// Count users
    pub async fn count(&self) -> Result<u64, DomainError> {
        self.repository.count(&UserFilter::All).await
    }

    /// Merge `patch` into one user and return the updated record
    ///
    /// Atomic for the single record. The username cannot be changed.
    pub async fn update(&self, username: &str, patch: UserPatch) -> Result<User, DomainError> {
        let patch = self.prepare_patch(patch)?;

        let user = self
            .repository
            .find_one_and_update(username, &patch)
            .await?
            .ok_or_else(|| not_found(username))?;

        debug!(username = %username, "User updated");
        Ok(user)
    }

    /// Merge `patch` into every listed user
    ///
    /// Best effort: not atomic across the set. Returns how many records
    /// matched; unknown usernames are skipped silently.
    pub async fn update_many(
        &self,
        usernames: &[String],
        patch: UserPatch,
    ) -> Result<u64, DomainError> {
        let patch = self.prepare_patch(patch)?;
        let filter = UserFilter::Usernames(usernames.to_vec());

        let matched = self.repository.update_many(&filter, &patch).await?;

        info!(
            requested = usernames.len(),
            matched = matched,
            "Bulk user update finished"
        );
        Ok(matched)
    }

    /// Delete one user. Fails with `NotFound` when nothing was deleted.
    pub async fn delete_one(&self, username: &str) -> Result<(), DomainError> {
        let deleted = self.repository.delete_one(username).await?;

        if deleted == 0 {
            return Err(not_found(username));
        }

        info!(username = %username, "User deleted");
        Ok(())
    }

    /// Delete every listed user
    ///
    /// Best effort: a failure part way may leave a subset deleted. Returns
    /// the number deleted; unknown usernames are not errors.
    pub async fn delete(&self, usernames: &[String]) -> Result<u64, DomainError> {
        let filter = UserFilter::Usernames(usernames.to_vec());
        let deleted = self.repository.delete_many(&filter).await?;

        info!(
            requested = usernames.len(),
            deleted = deleted,
            "Bulk user delete finished"
        );
        Ok(deleted)
    }

    /// Hash a replacement password so plaintext never reaches the store
    fn prepare_patch(&self, mut patch: UserPatch) -> Result<UserPatch, DomainError> {
        if let Some(password) = patch.password.take() {
            validate_password(&password).map_err(|e| DomainError::validation(e.to_string()))?;
            patch.password = Some(self.hasher.hash(&password)?);
        }

        Ok(patch)
    }
}

fn not_found(username: &str) -> DomainError {
    DomainError::not_found(format!("User '{}' not found", username))
}
