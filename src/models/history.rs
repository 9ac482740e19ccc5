use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ExplorerError;

/// Default window width when the caller does not give `to`.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// `[from, to)` range over a multi-address history, in transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub from: u64,
    pub to: u64,
}

impl PaginationWindow {
    /// Absent `from` means 0; absent or zero `to` means `from + page_size`.
    pub fn new(from: Option<u64>, to: Option<u64>, page_size: u64) -> Result<Self, ExplorerError> {
        let from = from.unwrap_or(0);
        let to = match to {
            Some(to) if to > 0 => to,
            _ => from
                .checked_add(page_size)
                .ok_or_else(|| ExplorerError::invalid_parameter("from", &from.to_string()))?,
        };
        if to < from {
            return Err(ExplorerError::invalid_parameter("to", &to.to_string()));
        }
        Ok(Self { from, to })
    }

    /// `to` as reported back to the caller, clamped to what the index holds
    pub fn clamped_to(&self, total: u64) -> u64 {
        self.to.min(total)
    }
}

impl Default for PaginationWindow {
    fn default() -> Self {
        Self {
            from: 0,
            to: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Per-transaction rendering switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub no_asm: bool,
    pub no_script_sig: bool,
    pub no_spent: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryRequest {
    pub window: PaginationWindow,
    pub include_immature_bts: bool,
    pub render: RenderOptions,
}

/// A transaction as stored by the index; its identity is the txid.
///
/// `fields` holds the whole object as received, so `txid` and `hash` both
/// survive when the index sends them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct RawTransaction {
    pub txid: String,
    pub fields: Map<String, Value>,
}

impl RawTransaction {
    pub fn to_value(&self) -> Value {
        Value::Object(self.clone().into())
    }
}

impl TryFrom<Map<String, Value>> for RawTransaction {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let txid = ["txid", "hash"]
            .iter()
            .find_map(|key| fields.get(*key).and_then(Value::as_str))
            .ok_or_else(|| "transaction has no txid or hash".to_string())?
            .to_string();
        Ok(Self { txid, fields })
    }
}

impl From<RawTransaction> for Map<String, Value> {
    fn from(tx: RawTransaction) -> Self {
        let mut object = tx.fields;
        object.insert("txid".to_string(), Value::String(tx.txid));
        object
    }
}

/// One (address, transaction) hit in a history query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub addresses: Map<String, Value>,
    #[serde(default)]
    pub satoshis: Option<i64>,
    pub tx: RawTransaction,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistory {
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryPage {
    pub total_items: u64,
    pub from: u64,
    pub to: u64,
    pub items: Vec<Value>,
}
