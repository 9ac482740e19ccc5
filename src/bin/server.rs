use clap::Parser;
use std::sync::Arc;
use zen_explorer_api::api::{ApiServer, AppState};
use zen_explorer_api::config::AppConfig;
use zen_explorer_api::index::{ChainHeight, HeightMonitor, HeightMonitorConfig, IndexService, RpcIndexClient};
use zen_explorer_api::logging::init_logging;

#[derive(Parser)]
#[command(name = "zen-explorer-server")]
#[command(about = "HTTP API for Horizen address balances, unspent outputs and history")]
#[command(version)]
struct Args {
    /// Configuration file
    #[arg(long, default_value = "config.toml")]
    config: String,

    /// Server port, overriding the configuration
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = AppConfig::load_from(&args.config)?;
    if let Some(port) = args.port {
        config.api.port = port;
    }

    init_logging(&config.logging)?;

    let client = RpcIndexClient::new(config.index.endpoint.clone(), config.index.timeout_seconds)?;
    let index: Arc<dyn IndexService> = Arc::new(client);
    let height = ChainHeight::default();

    let monitor = Arc::new(HeightMonitor::new(
        index.clone(),
        height.clone(),
        Some(HeightMonitorConfig {
            poll_interval_seconds: config.index.height_poll_interval_seconds,
        }),
    ));

    match monitor.refresh().await {
        Ok(current) => log::info!("Index reachable at {}, chain height {}", config.index.endpoint, current),
        Err(e) => log::warn!("Index not reachable at startup, confirmations start from 0: {}", e),
    }

    let runner = Arc::clone(&monitor);
    tokio::spawn(async move { runner.start().await });

    let state = AppState::from_config(&config, index, height)?;
    let server = ApiServer::new(state, config.api.host.clone(), config.api.port, config.api.prefix.clone());

    if let Err(e) = server.start().await {
        log::error!("Server failed: {}", e);
        monitor.stop();
        return Err(e.into());
    }

    Ok(())
}
