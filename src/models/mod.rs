pub mod address;
pub mod amount;
pub mod history;
pub mod summary;
pub mod utxo;

pub use address::{Address, AddressKind, AddressParseError, AddressValidator, NetworkParams, split_addresses, MAINNET, TESTNET};
pub use amount::to_decimal;
pub use history::{HistoryEntry, HistoryPage, HistoryRequest, PaginationWindow, RawHistory, RawTransaction, RenderOptions, DEFAULT_PAGE_SIZE};
pub use summary::{AddressSummary, RawAddressSummary, SummaryField};
pub use utxo::{RawUtxo, UnspentOutput, confirmations, transform_utxo};
