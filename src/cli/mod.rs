//! CLI module for the User Admin API
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API
//! - `create-user`: add a user through the same service, e.g. to bootstrap
//!   the first administrator

pub mod create_user;
pub mod serve;

use clap::{Parser, Subcommand};

/// User Admin API - user record management over HTTP
#[derive(Parser)]
#[command(name = "user-admin-api")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API server
    Serve(serve::ServeArgs),

    /// Create a user in the configured store
    CreateUser(create_user::CreateUserArgs),
}
