//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod health;
pub mod items;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use router::{create_auth_router, create_items_router, create_standalone_router};
pub use state::{AuthState, ItemState, StandaloneState};
