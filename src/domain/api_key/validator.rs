//! Key validator trait

use async_trait::async_trait;

use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Answers whether a presented API key is currently valid
///
/// `Ok(false)` means the authority looked at the key and rejected it.
/// `Err(_)` means no answer could be obtained (network failure, timeout,
/// unexpected response); callers must treat it as a rejection but may log
/// or retry it differently.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KeyValidator: Send + Sync {
    async fn validate(&self, api_key: &str) -> Result<bool, DomainError>;
}

/// Transient result of a validation call
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
}
