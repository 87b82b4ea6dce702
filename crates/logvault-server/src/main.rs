//! logvault - log ingestion and live streaming server.

use clap::Parser;
use logvault_server::{Cli, LogServer};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "logvault=info,logvault_server=info,tower_http=info";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))?;
    let registry = tracing_subscriber::registry().with(filter);
    if cli.log_json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    let config = cli.into_config();
    info!(bind = %config.bind_addr, "starting logvault");
    info!("  Submit:  POST http://{}/api/logs", config.bind_addr);
    info!("  Live:    ws://{}/api/ws", config.bind_addr);

    let server = LogServer::open(config).await?;
    server
        .serve_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
