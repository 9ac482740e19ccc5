pub mod history;
pub mod message;
pub mod summary;
pub mod transaction;
pub mod utxo;

#[cfg(test)]
pub(crate) mod fake;

pub use history::{distinct_transactions, HistoryPaginator, DEFAULT_MAX_CONCURRENCY};
pub use message::{signed_message_hash, verify_signature, MessageVerifier, VerifyParams};
pub use summary::AddressSummaryService;
pub use transaction::{InsightTransactionRenderer, TransactionTransformer};
pub use utxo::UtxoService;
