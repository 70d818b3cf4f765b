//! Key validator implementations
//!
//! - `HttpKeyValidator`: asks the auth service over the network
//! - `CachedKeyValidator`: optional TTL cache of positive answers
//! - `AuthService` itself implements the trait for in-process use

mod cached;
mod http;

pub use cached::CachedKeyValidator;
pub use http::{HttpKeyValidator, HttpValidatorConfig};
