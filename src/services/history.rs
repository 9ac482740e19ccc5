use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;

use crate::error::Result;
use crate::index::{HistoryOptions, IndexService};
use crate::logging::MetricsLogger;
use crate::models::{Address, HistoryEntry, HistoryPage, HistoryRequest, RawTransaction};
use crate::services::transaction::TransactionTransformer;

pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Builds paged, deduplicated transaction histories across several addresses
#[derive(Clone)]
pub struct HistoryPaginator {
    index: Arc<dyn IndexService>,
    transformer: Arc<dyn TransactionTransformer>,
    max_concurrency: usize,
}

impl HistoryPaginator {
    pub fn new(
        index: Arc<dyn IndexService>,
        transformer: Arc<dyn TransactionTransformer>,
        max_concurrency: usize,
    ) -> Self {
        Self {
            index,
            transformer,
            max_concurrency: max_concurrency.max(1),
        }
    }

    pub async fn get_history(&self, addresses: &[Address], request: &HistoryRequest) -> Result<HistoryPage> {
        let start = Instant::now();
        let options = HistoryOptions {
            from: request.window.from,
            to: request.window.to,
            show_immature_bts: request.include_immature_bts,
        };
        let raw = self.index.get_address_history(addresses, &options).await?;

        let distinct: Vec<RawTransaction> = distinct_transactions(&raw.items).into_iter().cloned().collect();
        let distinct_count = distinct.len();

        // Results come back in dedup order; the first failure drops the rest.
        let transformer = Arc::clone(&self.transformer);
        let include_immature_bts = request.include_immature_bts;
        let render = request.render;
        let items: Vec<Value> = stream::iter(distinct)
            .map(move |tx| {
                let transformer = Arc::clone(&transformer);
                async move {
                    transformer
                        .transform_transaction(&tx, include_immature_bts, &render)
                        .await
                }
            })
            .buffered(self.max_concurrency)
            .try_collect()
            .await?;

        MetricsLogger::log_history_page(
            addresses.len(),
            raw.total_count,
            raw.items.len(),
            distinct_count,
            start.elapsed().as_millis() as u64,
        );

        Ok(HistoryPage {
            total_items: raw.total_count,
            from: request.window.from,
            to: request.window.clamped_to(raw.total_count),
            items,
        })
    }
}

/// Transactions in first-seen order, one per txid
pub fn distinct_transactions(entries: &[HistoryEntry]) -> Vec<&RawTransaction> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .iter()
        .map(|entry| &entry.tx)
        .filter(|tx| seen.insert(tx.txid.as_str()))
        .collect()
}
