//! User domain
//!
//! Domain types and traits for user records: the entity, partial updates,
//! record filters, input validation and the storage contract.

mod entity;
mod repository;
mod validation;

pub use entity::{NewUser, User, UserFilter, UserPatch};
pub use repository::{Projection, UserRepository};
pub use validation::{validate_password, validate_username, UserValidationError};

#[cfg(test)]
pub use repository::MockUserRepository;
