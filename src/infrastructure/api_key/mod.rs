//! API Key infrastructure implementations
//!
//! Key generation and the auth service that issues and validates keys.

mod generator;
mod service;

pub use generator::{ApiKeyGenerator, GeneratedApiKey, MIN_KEY_BYTES};
pub use service::AuthService;
