use clap::Parser;
use std::sync::Arc;
use zen_explorer_api::api::{init_config, AppState, Cli, CliHandler, Commands};
use zen_explorer_api::config::AppConfig;
use zen_explorer_api::index::{ChainHeight, HeightMonitor, IndexService, RpcIndexClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Quieter than the server unless RUST_LOG says otherwise
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    // Needs neither a config file nor the index
    if let Commands::InitConfig { output } = &cli.command {
        match init_config(output.as_deref()) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    let mut config = AppConfig::load_from(&cli.config)?;
    if let Some(endpoint) = &cli.endpoint {
        config.index.endpoint = endpoint.clone();
        config.validate()?;
    }

    let client = RpcIndexClient::new(config.index.endpoint.clone(), config.index.timeout_seconds)?;
    let index: Arc<dyn IndexService> = Arc::new(client);
    let height = ChainHeight::default();

    if let Err(e) = HeightMonitor::new(index.clone(), height.clone(), None).refresh().await {
        eprintln!("Warning: could not read chain height, confirmations will be 0: {}", e);
    }

    let handler = CliHandler::new(AppState::from_config(&config, index, height)?);

    match handler.execute_command(&cli.command).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
