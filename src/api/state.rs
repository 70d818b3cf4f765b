//! Router state for the two surfaces

use std::sync::Arc;

use axum::extract::FromRef;

use crate::domain::KeyValidator;
use crate::infrastructure::api_key::AuthService;
use crate::infrastructure::services::ItemService;

/// State of the auth surface
#[derive(Debug, Clone)]
pub struct AuthState {
    pub auth_service: AuthService,
}

/// State of the item surface
#[derive(Clone)]
pub struct ItemState {
    pub item_service: ItemService,
    pub validator: Arc<dyn KeyValidator>,
}

/// Both surfaces on one listener
#[derive(Clone)]
pub struct StandaloneState {
    pub auth: AuthState,
    pub items: ItemState,
}

impl AuthState {
    pub fn new(auth_service: AuthService) -> Self {
        Self { auth_service }
    }
}

impl ItemState {
    pub fn new(item_service: ItemService, validator: Arc<dyn KeyValidator>) -> Self {
        Self {
            item_service,
            validator,
        }
    }
}

impl StandaloneState {
    /// Gate items with the in-process auth service
    pub fn new(auth_service: AuthService, item_service: ItemService) -> Self {
        let validator: Arc<dyn KeyValidator> = Arc::new(auth_service.clone());
        Self {
            auth: AuthState::new(auth_service),
            items: ItemState::new(item_service, validator),
        }
    }
}

impl FromRef<StandaloneState> for AuthState {
    fn from_ref(state: &StandaloneState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<StandaloneState> for ItemState {
    fn from_ref(state: &StandaloneState) -> Self {
        state.items.clone()
    }
}
