//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Generic storage trait for CRUD operations on any entity type
///
/// This is the seam that lets the services run unchanged over the in-memory,
/// PostgreSQL and Redis backends.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves all entities in insertion order
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Creates a new entity.
    ///
    /// Fails with `DomainError::Conflict` if the key or any unique field value
    /// is already present. The check and the write are a single store operation.
    async fn create(&self, entity: E) -> Result<E, DomainError>;

    /// Updates an existing entity, returns `NotFound` if absent
    async fn update(&self, entity: E) -> Result<E, DomainError>;

    /// Deletes an entity by its key, returns true if deleted
    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError>;

    /// Finds the entity holding `value` in one of `E::UNIQUE_FIELDS`
    async fn find_by_unique_field(&self, field: &str, value: &str)
    -> Result<Option<E>, DomainError>;

    /// Allocates the next identifier from the store's sequence, starting at 1
    async fn next_id(&self) -> Result<u64, DomainError>;

    /// Round-trips to the backend to confirm it is reachable
    async fn ping(&self) -> Result<(), DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// Rejects lookups on fields the entity does not declare unique
pub fn ensure_unique_field<E: StorageEntity>(field: &str) -> Result<(), DomainError> {
    if E::UNIQUE_FIELDS.contains(&field) {
        Ok(())
    } else {
        Err(DomainError::validation(format!(
            "Field '{}' is not a unique field",
            field
        )))
    }
}
