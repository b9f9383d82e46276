//! User infrastructure module
//!
//! Implementations for user record management: password hashing with
//! bcrypt, the in-memory and MongoDB repositories, and the user service.

mod mongo_repository;
mod password;
mod repository;
mod service;

pub use mongo_repository::MongoUserRepository;
pub use password::{BcryptHasher, PasswordHasher, BCRYPT_COST};
pub use repository::InMemoryUserRepository;
pub use service::UserService;
