//! Standalone command - auth and item surfaces on one listener

use super::{bootstrap, resolve_addr, serve, ServeArgs};
use crate::api::create_standalone_router;

/// Run both services in one process
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    let config = bootstrap();
    let addr = resolve_addr(&config, &args, super::auth::DEFAULT_PORT)?;

    let state = crate::create_standalone_state(&config).await?;

    serve("standalone", addr, create_standalone_router(state)).await
}
