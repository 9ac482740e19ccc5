use serde::{Deserialize, Serialize};

use crate::models::amount::to_decimal;

/// Certificate output status codes reported by the index
pub const OUTSTATUS_TOP_QUALITY_CERT: i64 = 1;
pub const OUTSTATUS_LOW_QUALITY_CERT: i64 = 2;

/// Unspent output as returned by the index
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawUtxo {
    pub address: Option<String>,
    pub txid: Option<String>,
    pub output_index: Option<u32>,
    #[serde(default)]
    pub script: String,
    pub satoshis: Option<i64>,
    pub height: Option<i64>,
    pub timestamp: Option<i64>,
    pub backward_transfer: Option<bool>,
    pub mature: Option<bool>,
    pub maturity_height: Option<i64>,
    pub blocks_to_maturity: Option<i64>,
    pub outstatus: Option<i64>,
}

/// Client view of one spendable output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    pub address: String,
    pub txid: String,
    pub vout: u32,
    pub script_pub_key: String,
    pub amount: f64,
    pub satoshis: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    pub confirmations: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backward_transfer: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mature: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maturity_height: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks_to_maturity: Option<i64>,
}

/// Blocks including and after `height`, relative to `current_height`.
/// Unmined records (height <= 0) have no confirmations.
pub fn confirmations(height: i64, current_height: i64) -> i64 {
    if height > 0 {
        (current_height - height + 1).max(0)
    } else {
        0
    }
}

/// Map a raw index record into its client representation.
///
/// Returns `None` when the record lacks one of address, txid, output index or amount.
pub fn transform_utxo(raw: &RawUtxo, current_height: i64) -> Option<UnspentOutput> {
    let address = raw.address.clone()?;
    let txid = raw.txid.clone()?;
    let vout = raw.output_index?;
    let satoshis = raw.satoshis?;

    let mined_height = raw.height.filter(|h| *h > 0);

    let mut utxo = UnspentOutput {
        address,
        txid,
        vout,
        script_pub_key: raw.script.clone(),
        amount: to_decimal(satoshis),
        satoshis,
        height: mined_height,
        confirmations: confirmations(raw.height.unwrap_or(0), current_height),
        ts: raw.timestamp,
        backward_transfer: None,
        mature: None,
        maturity_height: None,
        blocks_to_maturity: None,
    };

    if raw.backward_transfer == Some(true) {
        utxo.backward_transfer = Some(true);
        utxo.mature = raw.mature;
        utxo.maturity_height = raw.maturity_height;
        utxo.blocks_to_maturity = raw.blocks_to_maturity;
    }

    // Placeholders: real values need a certificate maturity-info query.
    if matches!(
        raw.outstatus,
        Some(OUTSTATUS_TOP_QUALITY_CERT) | Some(OUTSTATUS_LOW_QUALITY_CERT)
    ) {
        utxo.backward_transfer = Some(true);
        utxo.mature = Some(false);
        utxo.maturity_height = Some(-1);
        utxo.blocks_to_maturity = Some(-1);
    }

    Some(utxo)
}
