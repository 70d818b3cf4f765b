//! Auth service
//!
//! Issues API keys on signup and answers whether a presented key is valid.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::api_key::{Credential, IssuedCredential, KeyValidator, Username};
use crate::domain::{DomainError, Storage};

use super::generator::ApiKeyGenerator;

/// Fresh keys to try when a generated key collides with an existing digest
const MAX_KEY_COLLISIONS: usize = 3;

/// Auth service owning the credential store
#[derive(Debug, Clone)]
pub struct AuthService {
    storage: Arc<dyn Storage<Credential>>,
    generator: ApiKeyGenerator,
}

impl AuthService {
    pub fn new(storage: Arc<dyn Storage<Credential>>) -> Self {
        Self {
            storage,
            generator: ApiKeyGenerator::default(),
        }
    }

    /// Create with a custom generator
    pub fn with_generator(mut self, generator: ApiKeyGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Registers `username` and issues its API key.
    ///
    /// Uniqueness is decided by the store's `create`, not by a prior lookup, so
    /// concurrent signups for the same name cannot both succeed.
    pub async fn signup(&self, username: &str) -> Result<IssuedCredential, DomainError> {
        let username =
            Username::new(username).map_err(|e| DomainError::validation(e.to_string()))?;

        for _ in 0..MAX_KEY_COLLISIONS {
            let generated = self.generator.generate();
            let credential = Credential::new(username.clone(), &generated.hash);

            match self.storage.create(credential).await {
                Ok(_) => {
                    info!(username = %username, "Issued API key");
                    return Ok(IssuedCredential {
                        username: username.to_string(),
                        api_key: generated.key,
                    });
                }
                Err(e) if e.is_conflict() => {
                    // the store rejected the write; find out which unique value clashed
                    if self.storage.exists(&username).await? {
                        debug!(username = %username, "Signup rejected, username taken");
                        return Err(DomainError::username_taken(username.as_str()));
                    }
                    warn!("Generated API key collided with an existing key, regenerating");
                }
                Err(e) => return Err(e),
            }
        }

        Err(DomainError::internal("Could not generate a unique API key"))
    }

    /// Returns true iff some credential holds exactly this key
    pub async fn validate(&self, api_key: &str) -> Result<bool, DomainError> {
        if api_key.trim().is_empty() {
            return Ok(false);
        }

        let hash = ApiKeyGenerator::hash_key(api_key);
        let credential = self
            .storage
            .find_by_unique_field(Credential::API_KEY_HASH_FIELD, &hash)
            .await?;

        Ok(credential.is_some())
    }

    /// Confirms the credential store is reachable
    pub async fn check_store(&self) -> Result<(), DomainError> {
        self.storage.ping().await
    }
}

/// In-process validation, used when both surfaces share one process
#[async_trait]
impl KeyValidator for AuthService {
    async fn validate(&self, api_key: &str) -> Result<bool, DomainError> {
        AuthService::validate(self, api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::mock::MockStorage;
    use crate::domain::StorageEntity;
    use crate::infrastructure::storage::InMemoryStorage;

    fn service() -> (AuthService, Arc<InMemoryStorage<Credential>>) {
        let storage = Arc::new(InMemoryStorage::<Credential>::new());
        (AuthService::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_signup_issues_key() {
        let (service, _) = service();

        let issued = service.signup("alice").await.unwrap();

        assert_eq!(issued.username, "alice");
        assert!(issued.api_key.starts_with("ak_"));
        assert!(service.validate(&issued.api_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_signup_is_rejected() {
        let (service, storage) = service();

        let first = service.signup("alice").await.unwrap();
        let second = service.signup("alice").await;

        assert!(matches!(second, Err(DomainError::UsernameTaken { .. })));

        let credentials = storage.list().await.unwrap();
        assert_eq!(credentials.len(), 1);
        assert_eq!(credentials[0].key().as_str(), "alice");
        // the original key keeps working
        assert!(service.validate(&first.api_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_signups_only_one_wins() {
        let (service, storage) = service();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.signup("bob").await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert!(matches!(e, DomainError::UsernameTaken { .. })),
            }
        }

        assert_eq!(winners, 1);
        assert_eq!(storage.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_username_is_validation_error() {
        let (service, _) = service();

        let result = service.signup("   ").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_validate_unknown_and_blank_keys() {
        let (service, _) = service();
        service.signup("alice").await.unwrap();

        assert!(!service.validate("ak_not-issued").await.unwrap());
        assert!(!service.validate("").await.unwrap());
    }

    #[tokio::test]
    async fn test_keys_are_distinct_per_user() {
        let (service, _) = service();

        let alice = service.signup("alice").await.unwrap();
        let bob = service.signup("bob").await.unwrap();

        assert_ne!(alice.api_key, bob.api_key);
        assert!(service.validate(&bob.api_key).await.unwrap());
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let storage = Arc::new(MockStorage::<Credential>::new().with_error("connection reset"));
        let service = AuthService::new(storage);

        assert!(matches!(
            service.signup("alice").await,
            Err(DomainError::Storage { .. })
        ));
        assert!(matches!(
            service.validate("ak_x").await,
            Err(DomainError::Storage { .. })
        ));
    }

    #[tokio::test]
    async fn test_usable_as_key_validator() {
        let (service, _) = service();
        let issued = service.signup("carol").await.unwrap();

        let validator: Arc<dyn KeyValidator> = Arc::new(service);
        assert!(validator.validate(&issued.api_key).await.unwrap());
        assert!(!validator.validate("wrong").await.unwrap());
    }
}
