//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Secondary fields whose values must be unique across the store.
    ///
    /// Backends enforce these at write time and expose them through
    /// `Storage::find_by_unique_field`.
    const UNIQUE_FIELDS: &'static [&'static str] = &[];

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;

    /// Returns the value of one of `UNIQUE_FIELDS`
    fn unique_value(&self, _field: &str) -> Option<&str> {
        None
    }
}
