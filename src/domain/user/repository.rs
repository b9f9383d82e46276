//! User repository trait

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::entity::{NewUser, User, UserFilter, UserPatch};
use crate::domain::DomainError;

/// Which fields a read returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    /// Everything except the password hash
    #[default]
    Public,
    /// Everything including the password hash
    WithCredential,
}

/// Storage contract for user records, keyed by unique username
///
/// Implementations must report a uniqueness violation on insert as
/// [`DomainError::Duplicate`] and every other backend failure as
/// [`DomainError::Storage`].
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new record and return it with its storage-assigned id.
    /// `candidate.password` must already be hashed. Fails with `Duplicate`
    /// and leaves the store untouched when the username is taken.
    async fn insert(&self, candidate: NewUser) -> Result<User, DomainError>;

    /// Look up a single record by username
    async fn find_one(
        &self,
        username: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError>;

    /// All records selected by `filter`, without password hashes
    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError>;

    /// Number of records selected by `filter`
    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError>;

    /// Atomically merge `patch` into one record and return the post-update
    /// record without the password hash. `None` when no record matched.
    async fn find_one_and_update(
        &self,
        username: &str,
        patch: &UserPatch,
    ) -> Result<Option<User>, DomainError>;

    /// Merge `patch` into every selected record. Not atomic across the set;
    /// returns the number of records matched.
    async fn update_many(&self, filter: &UserFilter, patch: &UserPatch)
    -> Result<u64, DomainError>;

    /// Remove one record. Returns the number removed (0 or 1).
    async fn delete_one(&self, username: &str) -> Result<u64, DomainError>;

    /// Remove every selected record. Not atomic across the set; returns the
    /// number removed.
    async fn delete_many(&self, filter: &UserFilter) -> Result<u64, DomainError>;
}
