use serde::{Deserialize, Serialize};

use crate::models::address::Address;
use crate::models::amount::to_decimal;

/// Aggregate counters for one address, as reported by the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAddressSummary {
    #[serde(default)]
    pub balance: i64,
    #[serde(default)]
    pub total_received: i64,
    #[serde(default)]
    pub total_spent: i64,
    #[serde(default)]
    pub unconfirmed_balance: i64,
    #[serde(default)]
    pub immature_balance: i64,
    #[serde(default)]
    pub appearances: u64,
    #[serde(default)]
    pub unconfirmed_appearances: u64,
    pub txids: Option<Vec<String>>,
}

/// Client view of an address summary
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSummary {
    pub addr_str: String,
    pub balance: f64,
    pub balance_sat: i64,
    pub total_received: f64,
    pub total_received_sat: i64,
    pub total_sent: f64,
    pub total_sent_sat: i64,
    pub unconfirmed_balance: f64,
    pub unconfirmed_balance_sat: i64,
    pub immature_balance: f64,
    pub immature_balance_sat: i64,
    // Misspelled names kept for existing clients.
    pub unconfirmed_tx_apperances: u64,
    pub unconfirmed_tx_appearances: u64,
    pub tx_apperances: u64,
    pub tx_appearances: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<Vec<String>>,
}

impl AddressSummary {
    pub fn from_raw(address: &Address, raw: RawAddressSummary) -> Self {
        Self {
            addr_str: address.to_string(),
            balance: to_decimal(raw.balance),
            balance_sat: raw.balance,
            total_received: to_decimal(raw.total_received),
            total_received_sat: raw.total_received,
            total_sent: to_decimal(raw.total_spent),
            total_sent_sat: raw.total_spent,
            unconfirmed_balance: to_decimal(raw.unconfirmed_balance),
            unconfirmed_balance_sat: raw.unconfirmed_balance,
            immature_balance: to_decimal(raw.immature_balance),
            immature_balance_sat: raw.immature_balance,
            unconfirmed_tx_apperances: raw.unconfirmed_appearances,
            unconfirmed_tx_appearances: raw.unconfirmed_appearances,
            tx_apperances: raw.appearances,
            tx_appearances: raw.appearances,
            transactions: raw.txids,
        }
    }

    pub fn field(&self, field: SummaryField) -> i64 {
        match field {
            SummaryField::Balance => self.balance_sat,
            SummaryField::TotalReceived => self.total_received_sat,
            SummaryField::TotalSent => self.total_sent_sat,
            SummaryField::UnconfirmedBalance => self.unconfirmed_balance_sat,
            SummaryField::ImmatureBalance => self.immature_balance_sat,
        }
    }
}

/// Scalar projections served by the summary sub-queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Balance,
    TotalReceived,
    TotalSent,
    UnconfirmedBalance,
    ImmatureBalance,
}

impl SummaryField {
    /// Whether the sub-query forwards the caller's immature-balance flag
    pub fn honors_immature_flag(self) -> bool {
        matches!(self, SummaryField::Balance | SummaryField::UnconfirmedBalance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::address::{AddressKind, MAINNET};
    use serde_json::json;

    fn scenario() -> RawAddressSummary {
        RawAddressSummary {
            balance: 150_000_000,
            total_received: 200_000_000,
            total_spent: 50_000_000,
            unconfirmed_balance: 0,
            immature_balance: 0,
            appearances: 3,
            unconfirmed_appearances: 0,
            txids: Some(vec!["t1".to_string(), "t2".to_string(), "t3".to_string()]),
        }
    }

    #[test]
    fn test_summary_shape() {
        let address = Address::from_hash(AddressKind::PubKeyHash, [4; 20], &MAINNET);
        let summary = AddressSummary::from_raw(&address, scenario());
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(value["addrStr"], json!(address.as_str()));
        assert_eq!(value["balance"], json!(1.5));
        assert_eq!(value["balanceSat"], json!(150_000_000));
        assert_eq!(value["totalReceived"], json!(2.0));
        assert_eq!(value["totalReceivedSat"], json!(200_000_000));
        assert_eq!(value["totalSent"], json!(0.5));
        assert_eq!(value["totalSentSat"], json!(50_000_000));
        assert_eq!(value["unconfirmedBalance"], json!(0.0));
        assert_eq!(value["immatureBalanceSat"], json!(0));
        assert_eq!(value["txApperances"], json!(3));
        assert_eq!(value["txAppearances"], json!(3));
        assert_eq!(value["unconfirmedTxApperances"], json!(0));
        assert_eq!(value["unconfirmedTxAppearances"], json!(0));
        assert_eq!(value["transactions"], json!(["t1", "t2", "t3"]));
    }

    #[test]
    fn test_missing_tx_list_is_omitted() {
        let address = Address::from_hash(AddressKind::PubKeyHash, [4; 20], &MAINNET);
        let mut raw = scenario();
        raw.txids = None;
        let value = serde_json::to_value(AddressSummary::from_raw(&address, raw)).unwrap();
        assert!(value.get("transactions").is_none());
    }

    #[test]
    fn test_field_projection() {
        let address = Address::from_hash(AddressKind::PubKeyHash, [4; 20], &MAINNET);
        let summary = AddressSummary::from_raw(&address, scenario());
        assert_eq!(summary.field(SummaryField::Balance), 150_000_000);
        assert_eq!(summary.field(SummaryField::TotalReceived), 200_000_000);
        assert_eq!(summary.field(SummaryField::TotalSent), 50_000_000);
        assert_eq!(summary.field(SummaryField::UnconfirmedBalance), 0);
        assert_eq!(summary.field(SummaryField::ImmatureBalance), 0);
    }

    #[test]
    fn test_index_payload_defaults() {
        let raw: RawAddressSummary = serde_json::from_value(json!({
            "balance": 10,
            "totalReceived": 10,
            "totalSpent": 0,
            "appearances": 1
        }))
        .unwrap();
        assert_eq!(raw.immature_balance, 0);
        assert_eq!(raw.unconfirmed_appearances, 0);
        assert_eq!(raw.txids, None);
    }
}
