//! Keygate
//!
//! Two cooperating HTTP services:
//! - an auth service that issues API keys on signup and validates them
//! - an item service whose CRUD routes require a key the auth service accepts
//!
//! Each service waits for its own store behind a bounded-retry startup guard
//! before it starts listening.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::{AuthState, ItemState, StandaloneState};
use config::AuthServiceSettings;
use domain::{Credential, DomainError, Item, KeyValidator, Storage, StorageEntity};
use infrastructure::{
    api_key::AuthService,
    key_validator::{CachedKeyValidator, HttpKeyValidator},
    services::ItemService,
    startup::StartupGuard,
    storage::StorageFactory,
};
use tracing::info;

/// Store name used by the auth service unless `storage.database` is set
pub const AUTH_DATABASE: &str = "user_service";
/// Store name used by the item service unless `storage.database` is set
pub const ITEM_DATABASE: &str = "item_service";

const CREDENTIALS_TABLE: &str = "credentials";
const ITEMS_TABLE: &str = "items";

/// Connects to a store through the startup guard
///
/// Returns `StoreUnavailable` once the configured attempts are used up.
pub async fn connect_store<E>(
    config: &AppConfig,
    default_database: &str,
    table: &str,
) -> Result<Arc<dyn Storage<E>>, DomainError>
where
    E: StorageEntity + 'static,
{
    let storage_config = config
        .storage
        .to_storage_config(default_database)
        .map_err(DomainError::configuration)?;

    info!(
        backend = ?storage_config.storage_type(),
        table,
        "Connecting to store"
    );

    let guard = StartupGuard::new(table, config.startup.policy());
    guard
        .run(|| StorageFactory::create::<E>(&storage_config, table))
        .await
}

/// Validator used by a standalone item service
///
/// Asks the auth service over HTTP, optionally behind a positive-result cache.
pub fn build_validator(settings: &AuthServiceSettings) -> Result<Arc<dyn KeyValidator>, DomainError> {
    let http = HttpKeyValidator::new(&settings.validator_config())?;
    info!(url = http.validate_url(), "Validating API keys against auth service");

    Ok(match settings.cache_ttl() {
        Some(ttl) => {
            info!(ttl_secs = ttl.as_secs(), "Caching positive validation results");
            Arc::new(CachedKeyValidator::new(http, ttl))
        }
        None => Arc::new(http),
    })
}

pub async fn create_auth_state(config: &AppConfig) -> Result<AuthState, DomainError> {
    let storage = connect_store::<Credential>(config, AUTH_DATABASE, CREDENTIALS_TABLE).await?;
    Ok(AuthState::new(AuthService::new(storage)))
}

pub async fn create_item_state(config: &AppConfig) -> Result<ItemState, DomainError> {
    let validator = build_validator(&config.auth_service)?;
    let storage = connect_store::<Item>(config, ITEM_DATABASE, ITEMS_TABLE).await?;
    Ok(ItemState::new(ItemService::new(storage), validator))
}

/// Both services in one process, items gated by the in-process auth service
pub async fn create_standalone_state(config: &AppConfig) -> Result<StandaloneState, DomainError> {
    let credentials =
        connect_store::<Credential>(config, AUTH_DATABASE, CREDENTIALS_TABLE).await?;
    let items = connect_store::<Item>(config, ITEM_DATABASE, ITEMS_TABLE).await?;

    Ok(StandaloneState::new(
        AuthService::new(credentials),
        ItemService::new(items),
    ))
}
