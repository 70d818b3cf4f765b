//! Domain layer - Core entities, errors and the seams services depend on

pub mod api_key;
pub mod error;
pub mod item;
pub mod storage;

pub use api_key::{Credential, IssuedCredential, KeyValidator, Username, ValidationResult};
pub use error::DomainError;
pub use item::{Item, ItemId};
pub use storage::{Storage, StorageEntity, StorageKey};
