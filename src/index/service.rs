use async_trait::async_trait;
use serde::Serialize;

use crate::error::IndexError;
use crate::models::{Address, RawAddressSummary, RawHistory, RawUtxo};

/// Options forwarded with a summary query
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOptions {
    pub no_tx_list: bool,
    pub show_immature_balance: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<u64>,
}

impl SummaryOptions {
    /// The range is only forwarded when both ends are given
    pub fn with_range(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        if let (Some(from), Some(to)) = (from, to) {
            self.from = Some(from);
            self.to = Some(to);
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UtxoOptions {
    #[serde(rename = "showImmatureBTs")]
    pub show_immature_bts: bool,
    #[serde(rename = "queryMempool")]
    pub query_mempool: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HistoryOptions {
    pub from: u64,
    pub to: u64,
    #[serde(rename = "showImmatureBTs")]
    pub show_immature_bts: bool,
}

/// Read-only view of the ledger indexing service
#[async_trait]
pub trait IndexService: Send + Sync {
    async fn get_address_summary(
        &self,
        address: &Address,
        options: &SummaryOptions,
    ) -> Result<RawAddressSummary, IndexError>;

    async fn get_address_unspent_outputs(
        &self,
        addresses: &[Address],
        options: &UtxoOptions,
    ) -> Result<Vec<RawUtxo>, IndexError>;

    async fn get_address_history(
        &self,
        addresses: &[Address],
        options: &HistoryOptions,
    ) -> Result<RawHistory, IndexError>;

    async fn get_best_height(&self) -> Result<i64, IndexError>;
}
