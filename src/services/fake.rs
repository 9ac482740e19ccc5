use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::IndexError;
use crate::index::{HistoryOptions, IndexService, SummaryOptions, UtxoOptions};
use crate::models::{Address, RawAddressSummary, RawHistory, RawUtxo};

/// In-memory index used by the service tests
#[derive(Default)]
pub(crate) struct FakeIndex {
    pub summary: RawAddressSummary,
    pub utxos: Vec<RawUtxo>,
    pub history: RawHistory,
    pub height: i64,
    pub fail_with: Option<(i64, String)>,
    pub summary_calls: Mutex<Vec<SummaryOptions>>,
    pub utxo_calls: Mutex<Vec<(usize, UtxoOptions)>>,
    pub history_calls: Mutex<Vec<HistoryOptions>>,
}

impl FakeIndex {
    fn check(&self) -> Result<(), IndexError> {
        match &self.fail_with {
            Some((code, message)) => Err(IndexError::Method {
                code: *code,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl IndexService for FakeIndex {
    async fn get_address_summary(
        &self,
        _address: &Address,
        options: &SummaryOptions,
    ) -> Result<RawAddressSummary, IndexError> {
        self.summary_calls.lock().unwrap().push(*options);
        self.check()?;
        Ok(self.summary.clone())
    }

    async fn get_address_unspent_outputs(
        &self,
        addresses: &[Address],
        options: &UtxoOptions,
    ) -> Result<Vec<RawUtxo>, IndexError> {
        self.utxo_calls.lock().unwrap().push((addresses.len(), *options));
        self.check()?;
        Ok(self.utxos.clone())
    }

    async fn get_address_history(
        &self,
        _addresses: &[Address],
        options: &HistoryOptions,
    ) -> Result<RawHistory, IndexError> {
        self.history_calls.lock().unwrap().push(*options);
        self.check()?;
        Ok(self.history.clone())
    }

    async fn get_best_height(&self) -> Result<i64, IndexError> {
        self.check()?;
        Ok(self.height)
    }
}
