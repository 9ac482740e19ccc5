use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use tokio::signal;
use tokio::time::interval;

use crate::error::IndexError;
use crate::index::service::IndexService;
use crate::logging::MetricsLogger;

/// Best-known chain height, shared read-only with the request path
#[derive(Debug, Clone, Default)]
pub struct ChainHeight {
    inner: Arc<AtomicI64>,
}

impl ChainHeight {
    pub fn new(height: i64) -> Self {
        Self {
            inner: Arc::new(AtomicI64::new(height)),
        }
    }

    pub fn get(&self) -> i64 {
        self.inner.load(Ordering::Acquire)
    }

    pub fn set(&self, height: i64) {
        self.inner.store(height, Ordering::Release);
    }
}

pub struct HeightMonitorConfig {
    pub poll_interval_seconds: u64,
}

impl Default for HeightMonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
        }
    }
}

/// Keeps a `ChainHeight` in step with the index
pub struct HeightMonitor {
    index: Arc<dyn IndexService>,
    height: ChainHeight,
    pub config: HeightMonitorConfig,
    pub shutdown_signal: Arc<AtomicBool>,
}

impl HeightMonitor {
    pub fn new(index: Arc<dyn IndexService>, height: ChainHeight, config: Option<HeightMonitorConfig>) -> Self {
        Self {
            index,
            height,
            config: config.unwrap_or_default(),
            shutdown_signal: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fetch the height once and publish it
    pub async fn refresh(&self) -> Result<i64, IndexError> {
        let current = self.index.get_best_height().await?;
        let previous = self.height.get();
        if current != previous {
            MetricsLogger::log_chain_height(previous, current);
        }
        self.height.set(current);
        Ok(current)
    }

    /// Poll until ctrl-c or `shutdown_signal` is raised
    pub async fn start(&self) {
        info!(
            "Starting chain height monitor with {} second polling interval",
            self.config.poll_interval_seconds
        );

        let shutdown_signal = Arc::clone(&self.shutdown_signal);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received shutdown signal");
                    shutdown_signal.store(true, Ordering::Relaxed);
                }
                Err(err) => {
                    error!("Unable to listen for shutdown signal: {}", err);
                }
            }
        });

        let mut ticker = interval(Duration::from_secs(self.config.poll_interval_seconds));

        loop {
            ticker.tick().await;

            if self.shutdown_signal.load(Ordering::Relaxed) {
                info!("Shutdown signal received, stopping chain height monitor");
                return;
            }

            // Keep serving the last known height while the index is unreachable.
            if let Err(e) = self.refresh().await {
                warn!("Failed to refresh chain height (keeping {}): {}", self.height.get(), e);
            }
        }
    }

    pub fn stop(&self) {
        self.shutdown_signal.store(true, Ordering::Relaxed);
    }
}
