//! HTTP server command
//!
//! Waits for the database (bounded retries), applies the schema, then
//! serves until SIGTERM/Ctrl+C. A database that never comes up aborts
//! startup with a non-zero exit.

use anyhow::{Context, Result};
use clap::Parser;
use ohmyblog_core::Settings;
use ohmyblog_server::{run_server, Lifecycle, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (overrides server.host)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(long, short = 'p')]
    pub port: Option<u16>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,
}

pub async fn run_serve(args: ServeArgs, mut settings: Settings) -> Result<()> {
    if let Some(host) = args.host {
        settings.server.host = host;
    }
    if let Some(port) = args.port {
        settings.server.port = port;
    }
    settings.server.cors_permissive |= args.cors_permissive;
    settings.validate().context("Invalid server settings")?;

    let config = ServerConfig::from_settings(&settings.server)
        .await
        .context("Invalid bind address")?;
    let lifecycle = Lifecycle::new(settings);

    let state = lifecycle
        .app_state()
        .await
        .context("Startup failed: database is not available")?;

    tracing::info!("Starting ohmyblog server on {}", config.bind_addr);
    let served = run_server(state, config).await.context("Server error");

    lifecycle.dispose().await;
    served
}
