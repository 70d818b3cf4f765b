//! Item domain

mod entity;
mod validation;

pub use entity::{Item, ItemId};
pub use validation::{validate_item_name, validate_item_value, ItemValidationError};
