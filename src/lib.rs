pub mod api;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod models;
pub mod services;

pub use config::{ApiConfig, AppConfig, HistoryConfig, IndexConfig, LoggingConfig, NetworkConfig};
pub use error::{ExplorerError, IndexError, Result};
pub use index::{ChainHeight, HeightMonitor, IndexService, RpcIndexClient};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
