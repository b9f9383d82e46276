//! MongoDB user repository implementation

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use futures::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{
    ClientOptions, FindOneAndUpdateOptions, FindOneOptions, FindOptions, IndexOptions,
    ReturnDocument,
};
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::MongoConfig;
use crate::domain::user::{NewUser, Projection, User, UserFilter, UserPatch, UserRepository};
use crate::domain::DomainError;

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Stored shape of a user in the collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_login: Option<bson::DateTime>,
}

impl UserDocument {
    fn from_candidate(id: ObjectId, candidate: NewUser) -> Self {
        Self {
            id: Some(id),
            username: candidate.username,
            password: Some(candidate.password),
            first_name: candidate.first_name,
            last_name: candidate.last_name,
            last_login: None,
        }
    }

    fn into_user(self) -> User {
        User::from_parts(
            self.id.map(|id| id.to_hex()).unwrap_or_default(),
            self.username,
            self.password,
            self.first_name,
            self.last_name,
            self.last_login.map(|dt| dt.to_chrono()),
        )
    }
}

/// MongoDB implementation of UserRepository
///
/// Single-document operations (`insert`, `find_one_and_update`,
/// `delete_one`) are atomic on the server. `update_many` and `delete_many`
/// are not atomic across the matched set.
#[derive(Debug, Clone)]
pub struct MongoUserRepository {
    collection: Collection<UserDocument>,
}

impl MongoUserRepository {
    /// Connect to MongoDB and make sure the unique username index exists
    pub async fn connect(config: &MongoConfig) -> Result<Self, DomainError> {
        config.validate().map_err(DomainError::configuration)?;

        let mut options = ClientOptions::parse(&config.uri)
            .await
            .map_err(|e| DomainError::configuration(format!("Invalid MongoDB URI: {}", e)))?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());
        options.max_pool_size = Some(config.pool_size);
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));

        let client = Client::with_options(options)
            .map_err(|e| DomainError::storage(format!("Failed to create MongoDB client: {}", e)))?;

        let collection = client
            .database(&config.database)
            .collection::<UserDocument>(&config.collection);

        let repository = Self { collection };
        repository.ensure_indexes().await?;

        info!(
            database = %config.database,
            collection = %config.collection,
            "MongoDB user repository ready"
        );

        Ok(repository)
    }

    async fn ensure_indexes(&self) -> Result<(), DomainError> {
        let index = IndexModel::builder()
            .keys(doc! { "username": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();

        self.collection
            .create_index(index, None)
            .await
            .map_err(|e| storage_error("Failed to create username index", e))?;

        Ok(())
    }
}

/// Whether the driver error is a unique index violation
fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn storage_error(context: &str, err: MongoError) -> DomainError {
    DomainError::storage(format!("{}: {}", context, err))
}

fn filter_document(filter: &UserFilter) -> Document {
    match filter {
        UserFilter::All => doc! {},
        UserFilter::Usernames(names) => doc! { "username": { "$in": names.clone() } },
    }
}

fn projection_document(projection: Projection) -> Option<Document> {
    match projection {
        Projection::Public => Some(doc! { "password": 0 }),
        Projection::WithCredential => None,
    }
}

/// `$set` body for a patch; only the fields present are written
fn set_document(patch: &UserPatch) -> Document {
    let mut set = Document::new();

    if let Some(password) = &patch.password {
        set.insert("password", password.clone());
    }
    // A cleared name is stored as null
    if let Some(first_name) = &patch.first_name {
        set.insert("firstName", first_name.clone());
    }
    if let Some(last_name) = &patch.last_name {
        set.insert("lastName", last_name.clone());
    }
    if let Some(last_login) = patch.last_login {
        set.insert("lastLogin", bson::DateTime::from_chrono(last_login));
    }

    set
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn insert(&self, candidate: NewUser) -> Result<User, DomainError> {
        let document = UserDocument::from_candidate(ObjectId::new(), candidate);

        let result = self.collection.insert_one(&document, None).await;

        match result {
            Ok(_) => Ok(document.into_user()),
            Err(e) if is_duplicate_key(&e) => Err(DomainError::duplicate(format!(
                "Username '{}' already exists",
                document.username
            ))),
            Err(e) => Err(storage_error("Failed to insert user", e)),
        }
    }

    async fn find_one(
        &self,
        username: &str,
        projection: Projection,
    ) -> Result<Option<User>, DomainError> {
        let options = FindOneOptions::builder()
            .projection(projection_document(projection))
            .build();

        let document = self
            .collection
            .find_one(doc! { "username": username }, options)
            .await
            .map_err(|e| storage_error("Failed to find user", e))?;

        Ok(document.map(UserDocument::into_user))
    }

    async fn find_many(&self, filter: &UserFilter) -> Result<Vec<User>, DomainError> {
        let options = FindOptions::builder()
            .projection(projection_document(Projection::Public))
            .build();

        let cursor = self
            .collection
            .find(filter_document(filter), options)
            .await
            .map_err(|e| storage_error("Failed to list users", e))?;

        let documents: Vec<UserDocument> = cursor
            .try_collect()
            .await
            .map_err(|e| storage_error("Failed to read users", e))?;

        Ok(documents.into_iter().map(UserDocument::into_user).collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        self.collection
            .count_documents(filter_document(filter), None)
            .await
            .map_err(|e| storage_error("Failed to count users", e))
    }

    async fn find_one_and_update(
        &self,
        username: &str,
        patch: &UserPatch,
    ) -> Result<Option<User>, DomainError> {
        // An empty $set is rejected by the server
        if patch.is_empty() {
            return self.find_one(username, Projection::Public).await;
        }

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .projection(projection_document(Projection::Public))
            .build();

        let document = self
            .collection
            .find_one_and_update(
                doc! { "username": username },
                doc! { "$set": set_document(patch) },
                options,
            )
            .await
            .map_err(|e| storage_error("Failed to update user", e))?;

        Ok(document.map(UserDocument::into_user))
    }

    async fn update_many(
        &self,
        filter: &UserFilter,
        patch: &UserPatch,
    ) -> Result<u64, DomainError> {
        if patch.is_empty() {
            return self.count(filter).await;
        }

        let result = self
            .collection
            .update_many(
                filter_document(filter),
                doc! { "$set": set_document(patch) },
                None,
            )
            .await
            .map_err(|e| storage_error("Failed to update users", e))?;

        debug!(
            matched = result.matched_count,
            modified = result.modified_count,
            "Bulk user update applied"
        );

        Ok(result.matched_count)
    }

    async fn delete_one(&self, username: &str) -> Result<u64, DomainError> {
        let result = self
            .collection
            .delete_one(doc! { "username": username }, None)
            .await
            .map_err(|e| storage_error("Failed to delete user", e))?;

        Ok(result.deleted_count)
    }

    async fn delete_many(&self, filter: &UserFilter) -> Result<u64, DomainError> {
        let result = self
            .collection
            .delete_many(filter_document(filter), None)
            .await
            .map_err(|e| storage_error("Failed to delete users", e))?;

        Ok(result.deleted_count)
    }
}
