//! User Admin API
//!
//! HTTP service managing user records for administrative front-ends:
//! - Create, read, update and delete users keyed by username
//! - Bcrypt password hashing before anything reaches the store
//! - In-memory or MongoDB backed storage

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AppState, UserServiceTrait};
use config::StorageBackend;
use domain::DomainError;
use infrastructure::user::{BcryptHasher, InMemoryUserRepository, MongoUserRepository, UserService};
use tracing::info;

/// Create the application state with default configuration (in-memory store)
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let user_service = create_user_service(config).await?;
    Ok(AppState::new(user_service))
}

/// Build the user service over the configured store
pub async fn create_user_service(
    config: &AppConfig,
) -> Result<Arc<dyn UserServiceTrait>, DomainError> {
    let hasher = Arc::new(BcryptHasher::new());
    info!("Storage backend: {:?}", config.storage.backend);

    let service: Arc<dyn UserServiceTrait> = match config.storage.backend {
        StorageBackend::Memory => {
            info!("Using in-memory user store; records are lost on restart");
            Arc::new(UserService::new(
                Arc::new(InMemoryUserRepository::new()),
                hasher,
            ))
        }
        StorageBackend::Mongodb => {
            info!(
                database = %config.storage.mongodb.database,
                collection = %config.storage.mongodb.collection,
                "Connecting to MongoDB..."
            );
            let repository = MongoUserRepository::connect(&config.storage.mongodb).await?;
            info!("MongoDB connection established");
            Arc::new(UserService::new(Arc::new(repository), hasher))
        }
    };

    Ok(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MongoConfig;

    #[tokio::test]
    async fn test_default_state_uses_memory_store() {
        let state = create_app_state().await.unwrap();

        assert_eq!(state.user_service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_mongo_config_is_rejected() {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Mongodb;
        config.storage.mongodb = MongoConfig {
            uri: String::new(),
            ..MongoConfig::default()
        };

        let err = create_user_service(&config).await.err().unwrap();

        assert!(matches!(err, DomainError::Configuration { .. }));
    }
}
