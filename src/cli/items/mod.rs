//! Items command - runs the item service gated by the auth service

use tracing::info;

use super::{bootstrap, resolve_addr, serve, ServeArgs};
use crate::api::create_items_router;

pub const DEFAULT_PORT: u16 = 5001;

/// Run the item service
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let addr = resolve_addr(&config, &args, DEFAULT_PORT)?;

    let state = crate::create_item_state(&config).await?;
    info!(auth_service = %config.auth_service.base_url, "Item store ready");

    serve("items", addr, create_items_router(state)).await
}
