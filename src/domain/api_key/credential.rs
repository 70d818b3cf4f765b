//! Credential entity - the username to API key binding owned by the auth service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_username, UsernameValidationError};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Username, the primary key of a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Create a new Username after validation
    pub fn new(username: impl Into<String>) -> Result<Self, UsernameValidationError> {
        let username = username.into();
        validate_username(&username)?;
        Ok(Self(username))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl StorageKey for Username {
    fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Username {
    type Error = UsernameValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Username> for String {
    fn from(username: Username) -> Self {
        username.0
    }
}

impl std::fmt::Display for Username {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stored credential
///
/// Only the digest of the API key is kept; the plaintext is handed out once
/// at signup as an [`IssuedCredential`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    username: Username,
    api_key_hash: String,
    created_at: DateTime<Utc>,
}

impl Credential {
    pub const API_KEY_HASH_FIELD: &'static str = "api_key_hash";

    pub fn new(username: Username, api_key_hash: impl Into<String>) -> Self {
        Self {
            username,
            api_key_hash: api_key_hash.into(),
            created_at: Utc::now(),
        }
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn api_key_hash(&self) -> &str {
        &self.api_key_hash
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl StorageEntity for Credential {
    type Key = Username;

    const UNIQUE_FIELDS: &'static [&'static str] = &[Self::API_KEY_HASH_FIELD];

    fn key(&self) -> &Self::Key {
        &self.username
    }

    fn unique_value(&self, field: &str) -> Option<&str> {
        match field {
            Self::API_KEY_HASH_FIELD => Some(&self.api_key_hash),
            _ => None,
        }
    }
}

/// Result of a successful signup: the only time the plaintext key is visible
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedCredential {
    pub username: String,
    pub api_key: String,
}
