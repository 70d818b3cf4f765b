//! Item service - CRUD operations on the item store

use std::sync::Arc;

use tracing::debug;

use crate::domain::item::{validate_item_name, validate_item_value};
use crate::domain::storage::Storage;
use crate::domain::{DomainError, Item, ItemId};

pub const ITEM_NOT_FOUND: &str = "Item not found";

/// Request to create a new item
#[derive(Debug, Clone)]
pub struct CreateItemRequest {
    pub name: String,
    pub value: Option<String>,
}

/// Request to update an existing item
///
/// `None` leaves a field untouched. `value: Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct UpdateItemRequest {
    pub name: Option<String>,
    pub value: Option<Option<String>>,
}

/// Item service for CRUD operations
#[derive(Debug, Clone)]
pub struct ItemService {
    storage: Arc<dyn Storage<Item>>,
}

impl ItemService {
    /// Create a new ItemService with the given storage
    pub fn new(storage: Arc<dyn Storage<Item>>) -> Self {
        Self { storage }
    }

    /// Create an item under the next id from the store's sequence
    pub async fn create(&self, request: CreateItemRequest) -> Result<Item, DomainError> {
        validate_item_name(&request.name).map_err(|e| DomainError::validation(e.to_string()))?;

        if let Some(value) = &request.value {
            validate_item_value(value).map_err(|e| DomainError::validation(e.to_string()))?;
        }

        let id = ItemId::new(self.storage.next_id().await?);
        debug!(item_id = %id, "Creating item");

        self.storage
            .create(Item::new(id, request.name, request.value))
            .await
    }

    /// List all items in creation order
    pub async fn list(&self) -> Result<Vec<Item>, DomainError> {
        self.storage.list().await
    }

    /// Get an item by ID
    pub async fn get(&self, id: &ItemId) -> Result<Item, DomainError> {
        self.storage
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(ITEM_NOT_FOUND))
    }

    /// Apply the present fields of `request` to an existing item
    pub async fn update(
        &self,
        id: &ItemId,
        request: UpdateItemRequest,
    ) -> Result<Item, DomainError> {
        let mut item = self.get(id).await?;

        if let Some(name) = request.name {
            validate_item_name(&name).map_err(|e| DomainError::validation(e.to_string()))?;
            item.name = name;
        }

        if let Some(value) = request.value {
            if let Some(value) = &value {
                validate_item_value(value).map_err(|e| DomainError::validation(e.to_string()))?;
            }
            item.value = value;
        }

        debug!(item_id = %id, "Updating item");

        match self.storage.update(item).await {
            Err(DomainError::NotFound { .. }) => Err(DomainError::not_found(ITEM_NOT_FOUND)),
            other => other,
        }
    }

    /// Delete an item, returning it as it was before deletion
    pub async fn delete(&self, id: &ItemId) -> Result<Item, DomainError> {
        let item = self.get(id).await?;

        if !self.storage.delete(id).await? {
            return Err(DomainError::not_found(ITEM_NOT_FOUND));
        }

        debug!(item_id = %id, "Deleted item");
        Ok(item)
    }

    /// Confirms the item store is reachable
    pub async fn check_store(&self) -> Result<(), DomainError> {
        self.storage.ping().await
    }
}
