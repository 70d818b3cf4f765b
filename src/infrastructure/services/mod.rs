//! Infrastructure services

mod item_service;

pub use item_service::{CreateItemRequest, ItemService, UpdateItemRequest, ITEM_NOT_FOUND};
