//! Auth command - runs the API key issuing service

use tracing::info;

use super::{bootstrap, resolve_addr, serve, ServeArgs};
use crate::api::create_auth_router;

pub const DEFAULT_PORT: u16 = 5000;

/// Run the auth service
///
/// The listener is bound only after the credential store is ready.
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let addr = resolve_addr(&config, &args, DEFAULT_PORT)?;

    let state = crate::create_auth_state(&config).await?;
    info!("Credential store ready");

    serve("auth", addr, create_auth_router(state)).await
}
