use std::sync::Arc;

use crate::error::Result;
use crate::index::{IndexService, SummaryOptions};
use crate::logging::LogContext;
use crate::models::{Address, AddressSummary, SummaryField};

/// Address balances and counters, shaped for clients
#[derive(Clone)]
pub struct AddressSummaryService {
    index: Arc<dyn IndexService>,
}

impl AddressSummaryService {
    pub fn new(index: Arc<dyn IndexService>) -> Self {
        Self { index }
    }

    pub async fn get_summary(&self, address: &Address, options: &SummaryOptions) -> Result<AddressSummary> {
        let raw = self.index.get_address_summary(address, options).await?;

        LogContext::new("summary", "get_summary")
            .with_address(address.as_str())
            .debug("Address summary fetched");

        Ok(AddressSummary::from_raw(address, raw))
    }

    /// Single scalar from the summary, in minimal units
    pub async fn get_field(&self, address: &Address, field: SummaryField, show_immature_balance: bool) -> Result<i64> {
        let options = SummaryOptions {
            show_immature_balance: field.honors_immature_flag() && show_immature_balance,
            ..Default::default()
        };
        let summary = self.get_summary(address, &options).await?;
        Ok(summary.field(field))
    }
}
