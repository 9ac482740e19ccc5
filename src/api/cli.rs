use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::api::http::AppState;
use crate::config::AppConfig;
use crate::error::{ConfigError, ExplorerError};
use crate::index::SummaryOptions;
use crate::models::{HistoryRequest, PaginationWindow, RenderOptions, SummaryField};
use crate::services::VerifyParams;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Explorer(#[from] ExplorerError),
    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("{0}")]
    Config(#[from] ConfigError),
}

#[derive(Parser)]
#[command(name = "zen-explorer-cli")]
#[command(about = "Query address balances, unspent outputs and history from a Horizen index")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, default_value = "config.toml")]
    pub config: String,

    /// Index RPC endpoint, overriding the configuration
    #[arg(long)]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Balances, counters and transaction ids of one address
    Summary {
        address: String,
        #[arg(long)]
        no_tx_list: bool,
        #[arg(long)]
        show_immature_balance: bool,
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        to: Option<u64>,
    },
    Balance {
        address: String,
        #[arg(long)]
        show_immature_balance: bool,
    },
    TotalReceived {
        address: String,
    },
    TotalSent {
        address: String,
    },
    UnconfirmedBalance {
        address: String,
        #[arg(long)]
        show_immature_balance: bool,
    },
    ImmatureBalance {
        address: String,
    },
    /// Unspent outputs of one or more comma-separated addresses
    Utxo {
        addresses: String,
        #[arg(long)]
        show_immature_bts: bool,
    },
    /// Paged transaction history of comma-separated addresses
    History {
        addresses: String,
        #[arg(long)]
        from: Option<u64>,
        #[arg(long)]
        to: Option<u64>,
        #[arg(long)]
        show_immature_bts: bool,
        #[arg(long)]
        no_asm: bool,
        #[arg(long)]
        no_script_sig: bool,
        #[arg(long)]
        no_spent: bool,
    },
    /// Check a signed message
    Verify {
        address: String,
        signature: String,
        message: String,
    },
    /// Print a default configuration, or write it to `--output`
    InitConfig {
        #[arg(long)]
        output: Option<String>,
    },
}

/// Sample configuration as TOML, or a note on where it was written
pub fn init_config(output: Option<&str>) -> Result<String, CliError> {
    match output {
        None => Ok(AppConfig::generate_sample_config()?),
        Some(path) => {
            AppConfig::default().save_to_file(path)?;
            Ok(format!("Wrote default configuration to {}", path))
        }
    }
}

/// Runs CLI commands through the same services as the HTTP API
pub struct CliHandler {
    state: AppState,
}

impl CliHandler {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Execute a command and return its pretty-printed JSON output
    pub async fn execute_command(&self, command: &Commands) -> Result<String, CliError> {
        let state = &self.state;

        let output = match command {
            Commands::Summary {
                address,
                no_tx_list,
                show_immature_balance,
                from,
                to,
            } => {
                let address = state.validator.validate_one(address)?;
                let options = SummaryOptions {
                    no_tx_list: *no_tx_list,
                    show_immature_balance: *show_immature_balance,
                    ..Default::default()
                }
                .with_range(*from, *to);
                pretty(&state.summaries.get_summary(&address, &options).await?)?
            }
            Commands::Balance {
                address,
                show_immature_balance,
            } => self.field(address, SummaryField::Balance, *show_immature_balance).await?,
            Commands::TotalReceived { address } => self.field(address, SummaryField::TotalReceived, false).await?,
            Commands::TotalSent { address } => self.field(address, SummaryField::TotalSent, false).await?,
            Commands::UnconfirmedBalance {
                address,
                show_immature_balance,
            } => {
                self.field(address, SummaryField::UnconfirmedBalance, *show_immature_balance)
                    .await?
            }
            Commands::ImmatureBalance { address } => self.field(address, SummaryField::ImmatureBalance, false).await?,
            Commands::Utxo {
                addresses,
                show_immature_bts,
            } => {
                let addresses = state.validator.validate_list(addresses)?;
                let outputs = match addresses.as_slice() {
                    [single] => state.utxos.list(single, *show_immature_bts).await?,
                    many => state.utxos.list_many(many, *show_immature_bts).await?,
                };
                pretty(&outputs)?
            }
            Commands::History {
                addresses,
                from,
                to,
                show_immature_bts,
                no_asm,
                no_script_sig,
                no_spent,
            } => {
                let addresses = state.validator.validate_list(addresses)?;
                let request = HistoryRequest {
                    window: PaginationWindow::new(*from, *to, state.page_size)?,
                    include_immature_bts: *show_immature_bts,
                    render: RenderOptions {
                        no_asm: *no_asm,
                        no_script_sig: *no_script_sig,
                        no_spent: *no_spent,
                    },
                };
                pretty(&state.history.get_history(&addresses, &request).await?)?
            }
            Commands::Verify {
                address,
                signature,
                message,
            } => {
                let params = VerifyParams {
                    address: Some(address.clone()),
                    signature: Some(signature.clone()),
                    message: Some(message.clone()),
                };
                pretty(&json!({ "result": state.messages.verify(&params)? }))?
            }
            Commands::InitConfig { output } => init_config(output.as_deref())?,
        };

        Ok(output)
    }

    async fn field(&self, address: &str, field: SummaryField, show_immature_balance: bool) -> Result<String, CliError> {
        let address = self.state.validator.validate_one(address)?;
        let value = self
            .state
            .summaries
            .get_field(&address, field, show_immature_balance)
            .await?;
        pretty(&value)
    }
}

fn pretty<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}
