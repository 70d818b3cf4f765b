//! Wire types shared by the HTTP surfaces

pub mod error;
pub mod json;

pub use error::{ApiError, ErrorBody};
pub use json::Json;
