//! Item entity

use serde::{Deserialize, Serialize};

use crate::domain::storage::{StorageEntity, StorageKey};

/// Service-assigned item identifier
///
/// Numeric on the wire; the decimal form doubles as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u64", into = "u64")]
pub struct ItemId {
    value: u64,
    key: String,
}

impl ItemId {
    pub fn new(value: u64) -> Self {
        Self {
            value,
            key: value.to_string(),
        }
    }

    /// Parses a path segment; only the canonical decimal form names an item
    pub fn parse(raw: &str) -> Option<Self> {
        raw.parse::<u64>()
            .ok()
            .filter(|value| value.to_string() == raw)
            .map(Self::new)
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl StorageKey for ItemId {
    fn as_str(&self) -> &str {
        &self.key
    }
}

impl From<u64> for ItemId {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<ItemId> for u64 {
    fn from(id: ItemId) -> Self {
        id.value
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// A name/value record owned by the item service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub value: Option<String>,
}

impl Item {
    pub fn new(id: ItemId, name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            id,
            name: name.into(),
            value,
        }
    }
}

impl StorageEntity for Item {
    type Key = ItemId;

    fn key(&self) -> &Self::Key {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_parse() {
        assert_eq!(ItemId::parse("42"), Some(ItemId::new(42)));
        assert_eq!(ItemId::parse("abc"), None);
        assert_eq!(ItemId::parse("-1"), None);
        assert_eq!(ItemId::new(42).as_str(), "42");
    }

    #[test]
    fn test_item_id_parse_rejects_aliases() {
        assert_eq!(ItemId::parse("+1"), None);
        assert_eq!(ItemId::parse("007"), None);
        assert_eq!(ItemId::parse(" 1"), None);
        assert_eq!(ItemId::parse("0"), Some(ItemId::new(0)));
    }

    #[test]
    fn test_item_serializes_numeric_id() {
        let item = Item::new(ItemId::new(1), "widget", Some("42".to_string()));
        let json = serde_json::to_value(&item).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"id": 1, "name": "widget", "value": "42"})
        );
    }

    #[test]
    fn test_item_without_value_serializes_null() {
        let item = Item::new(ItemId::new(3), "bare", None);
        let json = serde_json::to_value(&item).unwrap();

        assert!(json["value"].is_null());

        let restored: Item = serde_json::from_value(json).unwrap();
        assert_eq!(restored, item);
    }
}
