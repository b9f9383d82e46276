//! In-memory user repository implementation

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::user::{NewUser, Projection, User, UserFilter, UserPatch, UserRepository};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository
///
/// Records are keyed by username, which gives the unique index for free.
/// Every operation holds the write lock for its whole duration, so single
/// and bulk operations are both atomic here; callers must not rely on that
/// for bulk operations since the MongoDB store does not give it.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<BTreeMap<String, User>>>,
}

impl InMemoryUserRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository with initial users
    pub fn with_users(users: Vec<User>) -> Self {
        let users = users
            .into_iter()
            .map(|u| (u.username().to_string(), u))
            .collect();

        Self {
            users: Arc::new(RwLock::new(users)),
        }
    }
}

fn project(user: &User, projection: Projection) -> User {
    match projection {
        Projection::Public => user.clone().without_credential(),
        Projection::WithCredential => user.clone(),
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, candidate: NewUser) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if users.contains_key(&candidate.username) {
            return Err(DomainError::duplicate(format!(
                "Username '{}' already exists",
                candidate.username
            )));
        }

        let user = User::new(uuid::Uuid::new_v4().to_string(), candidate);
        users.insert(user.username().to_string(), user.clone());

        Ok(user)
    }

    async fn find_one(
        &self,
        username: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(username).map(|u| project(u, projection)))
    }

    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let users = self.users.read().await;

        Ok(users
            .values()
            .filter(|u| filter.matches(u))
            .map(|u| project(u, Projection::Public))
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let users = self.users.read().await;
        Ok(users.values().filter(|u| filter.matches(u)).count() as u64)
    }

    async fn find_one_and_update(
        &self,
        username: &str,
        patch: &UserPatch,
    ) -> Result<Option<User>, DomainError> {
        let mut users = self.users.write().await;

        Ok(users.get_mut(username).map(|user| {
            user.apply(patch);
            project(user, Projection::Public)
        }))
    }

    async fn update_many(
        &self,
        filter: &UserFilter,
        patch: &UserPatch,
    ) -> Result<u64, DomainError> {
        let mut users = self.users.write().await;
        let mut matched = 0;

        for user in users.values_mut().filter(|u| filter.matches(u)) {
            user.apply(patch);
            matched += 1;
        }

        Ok(matched)
    }

    async fn delete_one(&self, username: &str) -> Result<u64, DomainError> {
        let mut users = self.users.write().await;
        Ok(users.remove(username).map_or(0, |_| 1))
    }

    async fn delete_many(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let mut users = self.users.write().await;
        let before = users.len();

        users.retain(|_, u| !filter.matches(u));

        Ok((before - users.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user(username: &str) -> User {
        User::new(
            uuid::Uuid::new_v4().to_string(),
            NewUser::new(username, "hashed_password"),
        )
    }

    fn candidate(username: &str) -> NewUser {
        NewUser::new(username, "hashed_password")
    }

    #[tokio::test]
    async fn test_insert_and_find_one() {
        let repo = InMemoryUserRepository::new();

        repo.insert(candidate("alice")).await.unwrap();

        let found = repo.find_one("alice", Projection::Public).await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().username(), "alice");

        let missing = repo.find_one("bob", Projection::Public).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_projection() {
        let repo = InMemoryUserRepository::new();
        repo.insert(candidate("alice")).await.unwrap();

        let public = repo
            .find_one("alice", Projection::Public)
            .await
            .unwrap()
            .unwrap();
        assert!(public.password().is_none());

        let with_credential = repo
            .find_one("alice", Projection::WithCredential)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(with_credential.password(), Some("hashed_password"));
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let repo = InMemoryUserRepository::new();
        let first = repo.insert(candidate("alice")).await.unwrap();
        let first_id = first.id().to_string();
        assert!(!first_id.is_empty());

        let result = repo.insert(candidate("alice")).await;
        assert!(result.unwrap_err().is_duplicate());

        // The original record is untouched
        let stored = repo
            .find_one("alice", Projection::Public)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.id(), first_id);
        assert_eq!(repo.count(&UserFilter::All).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_find_many_excludes_passwords() {
        let repo = InMemoryUserRepository::with_users(vec![
            create_test_user("alice"),
            create_test_user("bob"),
        ]);

        let all = repo.find_many(&UserFilter::All).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|u| u.password().is_none()));

        let some = repo
            .find_many(&UserFilter::usernames(["bob", "carol"]))
            .await
            .unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].username(), "bob");
    }

    #[tokio::test]
    async fn test_find_one_and_update() {
        let repo = InMemoryUserRepository::new();
        repo.insert(candidate("alice")).await.unwrap();

        let updated = repo
            .find_one_and_update("alice", &UserPatch::new().with_first_name("Alice"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.first_name(), Some("Alice"));
        assert!(updated.password().is_none());

        let missing = repo
            .find_one_and_update("ghost", &UserPatch::new().with_first_name("Nobody"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_many_counts_matches() {
        let repo = InMemoryUserRepository::with_users(vec![
            create_test_user("a"),
            create_test_user("b"),
            create_test_user("c"),
        ]);

        let matched = repo
            .update_many(
                &UserFilter::usernames(["a", "b", "z"]),
                &UserPatch::new().with_last_name("X"),
            )
            .await
            .unwrap();
        assert_eq!(matched, 2);

        let c = repo.find_one("c", Projection::Public).await.unwrap().unwrap();
        assert!(c.last_name().is_none());
    }

    #[tokio::test]
    async fn test_delete_one() {
        let repo = InMemoryUserRepository::new();
        repo.insert(candidate("alice")).await.unwrap();

        assert_eq!(repo.delete_one("alice").await.unwrap(), 1);
        assert_eq!(repo.delete_one("alice").await.unwrap(), 0);
        assert!(repo
            .find_one("alice", Projection::Public)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_delete_many() {
        let repo = InMemoryUserRepository::with_users(vec![
            create_test_user("a"),
            create_test_user("b"),
            create_test_user("d"),
        ]);

        let deleted = repo
            .delete_many(&UserFilter::usernames(["a", "b", "c"]))
            .await
            .unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(repo.count(&UserFilter::All).await.unwrap(), 1);
    }
}
