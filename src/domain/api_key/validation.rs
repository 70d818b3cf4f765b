//! Username validation utilities

use thiserror::Error;

/// Errors that can occur while validating a signup username
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UsernameValidationError {
    #[error("Username is required")]
    Empty,

    #[error("Username exceeds maximum length of {0} characters")]
    TooLong(usize),

    #[error("Username contains a control character")]
    ControlCharacter,
}

const MAX_USERNAME_LENGTH: usize = 80;

/// Validate a username
///
/// Rules:
/// - Cannot be empty or whitespace only
/// - Maximum 80 characters
/// - No control characters
pub fn validate_username(username: &str) -> Result<(), UsernameValidationError> {
    if username.trim().is_empty() {
        return Err(UsernameValidationError::Empty);
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(UsernameValidationError::TooLong(MAX_USERNAME_LENGTH));
    }

    if username.chars().any(char::is_control) {
        return Err(UsernameValidationError::ControlCharacter);
    }

    Ok(())
}
