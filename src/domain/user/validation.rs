//! User validation utilities

use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Username exceeds maximum length of {0} characters")]
    UsernameTooLong(usize),

    #[error("Username contains invalid character: '{0}'. Only alphanumeric characters, '_', '-', '.' and '@' are allowed")]
    InvalidUsernameCharacter(char),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Password exceeds maximum length of {0} bytes")]
    PasswordTooLong(usize),
}

const MAX_USERNAME_LENGTH: usize = 64;
/// bcrypt only consumes the first 72 bytes of its input
const MAX_PASSWORD_BYTES: usize = 72;

/// Validate a username
///
/// Rules:
/// - Cannot be empty
/// - Maximum 64 characters
/// - Only alphanumeric characters, underscores, hyphens, dots and '@'
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    if username.is_empty() {
        return Err(UserValidationError::EmptyUsername);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    for c in username.chars() {
        if !c.is_ascii_alphanumeric() && !matches!(c, '_' | '-' | '.' | '@') {
            return Err(UserValidationError::InvalidUsernameCharacter(c));
        }
    }

    Ok(())
}

/// Validate a plaintext password before hashing
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::EmptyPassword);
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_BYTES));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        assert!(validate_username("a").is_ok());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("user_name").is_ok());
        assert!(validate_username("user-name").is_ok());
        assert!(validate_username("alice.smith@example.com").is_ok());
    }

    #[test]
    fn test_empty_username() {
        assert_eq!(
            validate_username(""),
            Err(UserValidationError::EmptyUsername)
        );
    }

    #[test]
    fn test_username_too_long() {
        let long_username = "a".repeat(65);
        assert_eq!(
            validate_username(&long_username),
            Err(UserValidationError::UsernameTooLong(64))
        );
    }

    #[test]
    fn test_username_invalid_character() {
        assert_eq!(
            validate_username("user name"),
            Err(UserValidationError::InvalidUsernameCharacter(' '))
        );
        assert_eq!(
            validate_username("a/b"),
            Err(UserValidationError::InvalidUsernameCharacter('/'))
        );
    }

    #[test]
    fn test_valid_passwords() {
        assert!(validate_password("pw123").is_ok());
        assert!(validate_password("P@ssw0rd!").is_ok());
        assert!(validate_password(&"a".repeat(72)).is_ok());
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(
            validate_password(""),
            Err(UserValidationError::EmptyPassword)
        );
    }

    #[test]
    fn test_password_too_long() {
        assert_eq!(
            validate_password(&"a".repeat(73)),
            Err(UserValidationError::PasswordTooLong(72))
        );
    }
}
