//! Remote key validation against the auth service's `/validate` endpoint

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::domain::api_key::{KeyValidator, ValidationResult};
use crate::domain::DomainError;

/// Configuration for the HTTP validator
#[derive(Debug, Clone)]
pub struct HttpValidatorConfig {
    /// Base URL of the auth service, e.g. `http://auth:5000`
    pub base_url: String,
    /// Per-call deadline covering connect, send and response
    pub timeout: Duration,
}

impl Default for HttpValidatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            timeout: Duration::from_millis(300),
        }
    }
}

impl HttpValidatorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    api_key: &'a str,
}

/// Validator that asks the auth service over HTTP
///
/// 200 `{valid}` is an answer, 403 is a rejection, anything else (other
/// statuses, transport errors, timeouts, unreadable bodies) is
/// `DomainError::ValidatorUnavailable`.
#[derive(Debug, Clone)]
pub struct HttpKeyValidator {
    client: reqwest::Client,
    validate_url: String,
}

impl HttpKeyValidator {
    pub fn new(config: &HttpValidatorConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            validate_url: format!("{}/validate", config.base_url.trim_end_matches('/')),
        })
    }

    pub fn validate_url(&self) -> &str {
        &self.validate_url
    }
}

#[async_trait]
impl KeyValidator for HttpKeyValidator {
    async fn validate(&self, api_key: &str) -> Result<bool, DomainError> {
        let response = self
            .client
            .post(&self.validate_url)
            .json(&ValidateRequest { api_key })
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "failed" };
                DomainError::validator_unavailable(format!("Validation call {}: {}", reason, e))
            })?;

        let status = response.status();
        debug!(status = %status, "Auth service answered validation call");

        match status {
            StatusCode::OK => {
                let result: ValidationResult = response.json().await.map_err(|e| {
                    DomainError::validator_unavailable(format!(
                        "Unreadable validation response: {}",
                        e
                    ))
                })?;
                Ok(result.valid)
            }
            StatusCode::FORBIDDEN => Ok(false),
            other => Err(DomainError::validator_unavailable(format!(
                "Unexpected validation status: {}",
                other
            ))),
        }
    }
}
