pub mod height_monitor;
pub mod rpc_client;
pub mod service;

pub use height_monitor::{ChainHeight, HeightMonitor, HeightMonitorConfig};
pub use rpc_client::RpcIndexClient;
pub use service::{HistoryOptions, IndexService, SummaryOptions, UtxoOptions};
