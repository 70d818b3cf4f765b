//! Positive-result cache in front of another key validator

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::domain::api_key::KeyValidator;
use crate::domain::DomainError;

/// Key validator wrapper that remembers positive answers for a fixed TTL
///
/// Only `Ok(true)` is cached. Rejections and failures always go back to the
/// inner validator. A key revoked upstream stays accepted here for at most `ttl`.
#[derive(Debug)]
pub struct CachedKeyValidator<V: KeyValidator> {
    inner: V,
    accepted: Cache<String, ()>,
}

impl<V: KeyValidator> CachedKeyValidator<V> {
    pub fn new(inner: V, ttl: Duration) -> Self {
        Self::with_capacity(inner, ttl, 10_000)
    }

    pub fn with_capacity(inner: V, ttl: Duration, capacity: u64) -> Self {
        let accepted = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(capacity)
            .build();

        Self { inner, accepted }
    }

    /// Drop every cached acceptance
    pub fn invalidate_all(&self) {
        self.accepted.invalidate_all();
    }
}

#[async_trait]
impl<V: KeyValidator> KeyValidator for CachedKeyValidator<V> {
    async fn validate(&self, api_key: &str) -> Result<bool, DomainError> {
        if self.accepted.contains_key(api_key) {
            tracing::debug!("Cache hit for accepted API key");
            return Ok(true);
        }

        let valid = self.inner.validate(api_key).await?;

        if valid {
            self.accepted.insert(api_key.to_string(), ()).await;
        }

        Ok(valid)
    }
}
