//! Password hashing utilities using bcrypt

use std::fmt::Debug;

use crate::domain::DomainError;

/// bcrypt cost factor used for every stored password
pub const BCRYPT_COST: u32 = 10;

/// Trait for password hashing operations
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// bcrypt-based password hasher with a fixed cost
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    /// Create a hasher using [`BCRYPT_COST`]
    pub fn new() -> Self {
        Self { cost: BCRYPT_COST }
    }

    /// Create a hasher with an explicit cost. Only meant for tests, where
    /// the production cost makes every case slow.
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| DomainError::hashing(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        bcrypt::verify(password, hash).unwrap_or(false)
    }
}
