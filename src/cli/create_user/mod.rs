//! Create-user command - adds a single user to the configured store

use clap::Args;
use tracing::warn;

use crate::config::{AppConfig, StorageBackend};
use crate::domain::NewUser;
use crate::infrastructure::logging;

use super::serve::parse_storage_backend;

/// Arguments for the create-user command
#[derive(Args, Debug)]
pub struct CreateUserArgs {
    /// Unique username
    #[arg(long, short)]
    pub username: String,

    /// Plaintext password; hashed before it is stored
    #[arg(long, short, env = "APP_NEW_USER_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    /// Override the configured storage backend (memory, mongodb)
    #[arg(long, value_parser = parse_storage_backend)]
    pub storage: Option<StorageBackend>,
}

impl CreateUserArgs {
    fn to_new_user(&self) -> NewUser {
        let mut candidate = NewUser::new(&self.username, &self.password);
        if let Some(first_name) = &self.first_name {
            candidate = candidate.with_first_name(first_name);
        }
        if let Some(last_name) = &self.last_name {
            candidate = candidate.with_last_name(last_name);
        }
        candidate
    }
}

/// Create the user and print the stored record (without password) as JSON
pub async fn run(args: CreateUserArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load()?;
    if let Some(backend) = args.storage {
        config.storage.backend = backend;
    }
    logging::init_logging(&config.logging);

    if config.storage.backend == StorageBackend::Memory {
        warn!("Creating a user in the in-memory store; it is discarded on exit");
    }

    let service = crate::create_user_service(&config).await?;
    let user = service.create(args.to_new_user()).await?;

    println!("{}", serde_json::to_string_pretty(&user)?);

    Ok(())
}
