//! In-memory storage implementation

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::storage::{ensure_unique_field, Storage, StorageEntity, StorageKey};
use crate::domain::DomainError;

#[derive(Debug)]
struct Entry<E> {
    position: u64,
    entity: E,
}

#[derive(Debug)]
struct Inner<E> {
    entities: HashMap<String, Entry<E>>,
    /// (field, value) -> entity key
    unique: HashMap<(String, String), String>,
    next_position: u64,
}

/// Thread-safe in-memory storage implementation
///
/// Useful for testing and development. Data is lost when the process terminates.
/// Uniqueness of keys and unique fields is checked and written under one write lock.
#[derive(Debug)]
pub struct InMemoryStorage<E>
where
    E: StorageEntity,
{
    inner: RwLock<Inner<E>>,
    sequence: AtomicU64,
}

impl<E> Default for InMemoryStorage<E>
where
    E: StorageEntity,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E> InMemoryStorage<E>
where
    E: StorageEntity,
{
    /// Creates a new empty in-memory storage
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                entities: HashMap::new(),
                unique: HashMap::new(),
                next_position: 0,
            }),
            sequence: AtomicU64::new(0),
        }
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner<E>>, DomainError> {
        self.inner
            .read()
            .map_err(|e| DomainError::storage(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner<E>>, DomainError> {
        self.inner
            .write()
            .map_err(|e| DomainError::storage(format!("Failed to acquire write lock: {}", e)))
    }
}

fn unique_entries<E: StorageEntity>(entity: &E) -> Vec<(String, String)> {
    E::UNIQUE_FIELDS
        .iter()
        .filter_map(|field| {
            entity
                .unique_value(field)
                .map(|value| (field.to_string(), value.to_string()))
        })
        .collect()
}

#[async_trait]
impl<E> Storage<E> for InMemoryStorage<E>
where
    E: StorageEntity + 'static,
{
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError> {
        let inner = self.read()?;
        Ok(inner.entities.get(key.as_str()).map(|e| e.entity.clone()))
    }

    async fn list(&self) -> Result<Vec<E>, DomainError> {
        let inner = self.read()?;

        let mut entries: Vec<&Entry<E>> = inner.entities.values().collect();
        entries.sort_by_key(|e| e.position);

        Ok(entries.into_iter().map(|e| e.entity.clone()).collect())
    }

    async fn create(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut inner = self.write()?;

        if inner.entities.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "Entity with key '{}' already exists",
                key
            )));
        }

        let unique = unique_entries(&entity);

        if let Some((field, _)) = unique.iter().find(|u| inner.unique.contains_key(*u)) {
            return Err(DomainError::conflict(format!(
                "Unique field '{}' already taken",
                field
            )));
        }

        for entry in unique {
            inner.unique.insert(entry, key.clone());
        }

        let position = inner.next_position;
        inner.next_position += 1;
        inner.entities.insert(
            key,
            Entry {
                position,
                entity: entity.clone(),
            },
        );

        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<E, DomainError> {
        let key = entity.key().as_str().to_string();
        let mut inner = self.write()?;

        let previous = match inner.entities.get(&key) {
            Some(entry) => unique_entries(&entry.entity),
            None => {
                return Err(DomainError::not_found(format!(
                    "Entity with key '{}' not found",
                    key
                )));
            }
        };

        let next = unique_entries(&entity);

        let taken = next.iter().find(|u| {
            inner
                .unique
                .get(*u)
                .is_some_and(|owner| owner.as_str() != key)
        });

        if let Some((field, _)) = taken {
            return Err(DomainError::conflict(format!(
                "Unique field '{}' already taken",
                field
            )));
        }

        for entry in previous {
            inner.unique.remove(&entry);
        }

        for entry in next {
            inner.unique.insert(entry, key.clone());
        }

        if let Some(slot) = inner.entities.get_mut(&key) {
            slot.entity = entity.clone();
        }

        Ok(entity)
    }

    async fn delete(&self, key: &E::Key) -> Result<bool, DomainError> {
        let mut inner = self.write()?;

        match inner.entities.remove(key.as_str()) {
            Some(entry) => {
                for unique in unique_entries(&entry.entity) {
                    inner.unique.remove(&unique);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_by_unique_field(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<E>, DomainError> {
        ensure_unique_field::<E>(field)?;
        let inner = self.read()?;

        let entity = inner
            .unique
            .get(&(field.to_string(), value.to_string()))
            .and_then(|key| inner.entities.get(key))
            .map(|entry| entry.entity.clone());

        Ok(entity)
    }

    async fn next_id(&self) -> Result<u64, DomainError> {
        Ok(self.sequence.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn ping(&self) -> Result<(), DomainError> {
        self.read().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::storage::StorageKey;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
    struct TestId(String);

    impl StorageKey for TestId {
        fn as_str(&self) -> &str {
            &self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestEntity {
        id: TestId,
        token: String,
    }

    impl StorageEntity for TestEntity {
        type Key = TestId;

        const UNIQUE_FIELDS: &'static [&'static str] = &["token"];

        fn key(&self) -> &Self::Key {
            &self.id
        }

        fn unique_value(&self, field: &str) -> Option<&str> {
            (field == "token").then_some(self.token.as_str())
        }
    }

    fn entity(id: &str, token: &str) -> TestEntity {
        TestEntity {
            id: TestId(id.to_string()),
            token: token.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        let e = entity("1", "t1");

        storage.create(e.clone()).await.unwrap();

        let result = storage.get(&TestId("1".to_string())).await.unwrap();
        assert_eq!(result, Some(e));
    }

    #[tokio::test]
    async fn test_create_key_conflict() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", "t1")).await.unwrap();
        let result = storage.create(entity("1", "t2")).await;

        assert!(result.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_create_unique_field_conflict() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        storage.create(entity("1", "shared")).await.unwrap();
        let result = storage.create(entity("2", "shared")).await;

        assert!(result.unwrap_err().is_conflict());
        assert!(storage.get(&TestId("2".to_string())).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_unique_field() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        storage.create(entity("1", "t1")).await.unwrap();

        let found = storage.find_by_unique_field("token", "t1").await.unwrap();
        assert_eq!(found.unwrap().id, TestId("1".to_string()));

        let missing = storage.find_by_unique_field("token", "nope").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_by_undeclared_field_is_rejected() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        let result = storage.find_by_unique_field("id", "1").await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_delete_releases_unique_values() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        storage.create(entity("1", "t1")).await.unwrap();

        assert!(storage.delete(&TestId("1".to_string())).await.unwrap());
        assert!(!storage.delete(&TestId("1".to_string())).await.unwrap());
        assert!(storage.find_by_unique_field("token", "t1").await.unwrap().is_none());

        storage.create(entity("2", "t1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_not_found() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        let result = storage.update(entity("1", "t1")).await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_update_moves_unique_value() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();
        storage.create(entity("1", "old")).await.unwrap();

        storage.update(entity("1", "new")).await.unwrap();

        assert!(storage.find_by_unique_field("token", "old").await.unwrap().is_none());
        assert!(storage.find_by_unique_field("token", "new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_list_preserves_insertion_order() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        for id in ["10", "2", "7"] {
            storage.create(entity(id, id)).await.unwrap();
        }

        let ids: Vec<String> = storage
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.id.0)
            .collect();

        assert_eq!(ids, vec!["10", "2", "7"]);
    }

    #[tokio::test]
    async fn test_next_id_is_monotonic_from_one() {
        let storage: InMemoryStorage<TestEntity> = InMemoryStorage::new();

        assert_eq!(storage.next_id().await.unwrap(), 1);
        assert_eq!(storage.next_id().await.unwrap(), 2);
        assert_eq!(storage.next_id().await.unwrap(), 3);
    }
}
