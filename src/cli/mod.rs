//! CLI module for Keygate
//!
//! Provides subcommands for running each service:
//! - `auth`: API key signup and validation
//! - `items`: item CRUD gated by the auth service
//! - `standalone`: both surfaces in one process

pub mod auth;
pub mod items;
pub mod standalone;

use std::net::{IpAddr, SocketAddr};

use axum::Router;
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Keygate - API key issuing and gated item services
#[derive(Parser)]
#[command(name = "keygate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the auth service
    Auth(ServeArgs),

    /// Run the item service
    Items(ServeArgs),

    /// Run both services on one listener
    Standalone(ServeArgs),
}

/// Arguments shared by every service command
#[derive(Args, Clone, Debug, Default)]
pub struct ServeArgs {
    /// Port to listen on (overrides config)
    #[arg(long)]
    pub port: Option<u16>,
}

/// Loads `.env` and layered config, then installs logging
pub(crate) fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration, using defaults: {e}");
            AppConfig::default()
        }
    };
    logging::init_logging(&config.logging);

    config
}

/// CLI flag, then `server.port`, then the service's own default
pub(crate) fn resolve_addr(
    config: &AppConfig,
    args: &ServeArgs,
    default_port: u16,
) -> anyhow::Result<SocketAddr> {
    let port = args.port.or(config.server.port).unwrap_or(default_port);
    Ok(SocketAddr::from((config.server.host.parse::<IpAddr>()?, port)))
}

pub(crate) async fn serve(name: &str, addr: SocketAddr, app: Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(service = name, %addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(service = name, "Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["keygate", "items", "--port", "8080"]);
        match cli.command {
            Command::Items(args) => assert_eq!(args.port, Some(8080)),
            _ => panic!("Expected items command"),
        }

        let cli = Cli::parse_from(["keygate", "auth"]);
        assert!(matches!(cli.command, Command::Auth(ServeArgs { port: None })));
    }

    #[test]
    fn test_port_precedence() {
        let mut config = AppConfig::default();

        let addr = resolve_addr(&config, &ServeArgs::default(), 5000).unwrap();
        assert_eq!(addr.port(), 5000);

        config.server.port = Some(6000);
        let addr = resolve_addr(&config, &ServeArgs::default(), 5000).unwrap();
        assert_eq!(addr.port(), 6000);

        let addr = resolve_addr(&config, &ServeArgs { port: Some(7000) }, 5000).unwrap();
        assert_eq!(addr.port(), 7000);
    }

    #[test]
    fn test_bad_host_is_an_error() {
        let mut config = AppConfig::default();
        config.server.host = "not-an-ip".to_string();

        assert!(resolve_addr(&config, &ServeArgs::default(), 5000).is_err());
    }
}
