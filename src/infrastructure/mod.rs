//! Infrastructure layer - Store backends, key handling and startup resilience

pub mod api_key;
pub mod key_validator;
pub mod logging;
pub mod services;
pub mod startup;
pub mod storage;
