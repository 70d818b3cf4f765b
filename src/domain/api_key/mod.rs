//! API Key domain
//!
//! Credentials issued by the auth service and the validator seam the item
//! service uses to check presented keys.

mod credential;
mod validation;
mod validator;

pub use credential::{Credential, IssuedCredential, Username};
pub use validation::{validate_username, UsernameValidationError};
pub use validator::{KeyValidator, ValidationResult};

#[cfg(test)]
pub use validator::MockKeyValidator;
