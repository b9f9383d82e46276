//! Domain layer - entities, errors and storage contracts

pub mod error;
pub mod user;

pub use error::DomainError;
pub use user::{NewUser, Projection, User, UserFilter, UserPatch, UserRepository};
