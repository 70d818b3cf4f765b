use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::auth;
use super::health;
use super::items;
use super::state::{AuthState, ItemState, StandaloneState};

/// Auth surface: signup and validate
pub fn create_auth_router(state: AuthState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check::<AuthState>))
        .merge(auth::routes::<AuthState>())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Item surface: CRUD gated by the state's validator
pub fn create_items_router(state: ItemState) -> Router {
    let validator = state.validator.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check::<ItemState>))
        .merge(items::routes::<ItemState>(validator))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Both surfaces on one listener, items gated in-process
pub fn create_standalone_router(state: StandaloneState) -> Router {
    let validator = state.items.validator.clone();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check::<StandaloneState>))
        .merge(auth::routes::<StandaloneState>())
        .merge(items::routes::<StandaloneState>(validator))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
