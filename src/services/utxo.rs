use std::sync::Arc;

use crate::error::{ExplorerError, Result};
use crate::index::{ChainHeight, IndexService, UtxoOptions};
use crate::logging::{LogContext, MetricsLogger};
use crate::models::{transform_utxo, Address, RawUtxo, UnspentOutput};

/// Spendable output listings for one or many addresses
#[derive(Clone)]
pub struct UtxoService {
    index: Arc<dyn IndexService>,
    height: ChainHeight,
}

impl UtxoService {
    pub fn new(index: Arc<dyn IndexService>, height: ChainHeight) -> Self {
        Self { index, height }
    }

    pub async fn list(&self, address: &Address, show_immature_bts: bool) -> Result<Vec<UnspentOutput>> {
        let options = UtxoOptions {
            show_immature_bts,
            query_mempool: false,
        };
        let raw = self
            .index
            .get_address_unspent_outputs(std::slice::from_ref(address), &options)
            .await?;

        Ok(self.transform_all(&raw, 1))
    }

    /// Multi-address listing; an index "not found" answer is an empty list
    pub async fn list_many(&self, addresses: &[Address], show_immature_bts: bool) -> Result<Vec<UnspentOutput>> {
        let options = UtxoOptions {
            show_immature_bts,
            query_mempool: true,
        };

        match self.index.get_address_unspent_outputs(addresses, &options).await {
            Ok(raw) => Ok(self.transform_all(&raw, addresses.len())),
            Err(e) if e.is_not_found() => {
                LogContext::new("utxo", "list_many")
                    .with_address_count(addresses.len())
                    .debug("Index has no outputs for these addresses");
                Ok(Vec::new())
            }
            Err(e) => Err(ExplorerError::IndexQueryFailed(e)),
        }
    }

    fn transform_all(&self, raw: &[RawUtxo], address_count: usize) -> Vec<UnspentOutput> {
        let current_height = self.height.get();
        let outputs: Vec<UnspentOutput> = raw
            .iter()
            .filter_map(|record| {
                let output = transform_utxo(record, current_height);
                if output.is_none() {
                    LogContext::new("utxo", "transform")
                        .with_metadata("record", serde_json::json!(record))
                        .warn("Skipping unspent output record with missing fields");
                }
                output
            })
            .collect();

        MetricsLogger::log_utxo_listing(address_count, outputs.len(), raw.len() - outputs.len());
        outputs
    }
}
