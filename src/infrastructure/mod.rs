//! Infrastructure layer - storage backends, hashing and logging

pub mod logging;
pub mod user;
