use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::{ExplorerError, Result};
use crate::index::ChainHeight;
use crate::models::{confirmations, RawTransaction, RenderOptions};

/// Turns a stored transaction into its client representation
#[async_trait]
pub trait TransactionTransformer: Send + Sync {
    async fn transform_transaction(
        &self,
        tx: &RawTransaction,
        include_immature_bts: bool,
        options: &RenderOptions,
    ) -> Result<Value>;
}

const SPENT_FIELDS: [&str; 3] = ["spentTxId", "spentIndex", "spentHeight"];

/// Insight-style rendering of a transaction
#[derive(Debug, Clone)]
pub struct InsightTransactionRenderer {
    height: ChainHeight,
}

impl InsightTransactionRenderer {
    pub fn new(height: ChainHeight) -> Self {
        Self { height }
    }

    fn render(&self, tx: &RawTransaction, include_immature_bts: bool, options: &RenderOptions) -> Result<Value> {
        let mut object = tx.fields.clone();
        object.insert("txid".to_string(), Value::String(tx.txid.clone()));

        let block_height = object.get("blockheight").and_then(Value::as_i64).unwrap_or(-1);
        object.insert(
            "confirmations".to_string(),
            Value::from(confirmations(block_height, self.height.get())),
        );

        if let Some(vin) = entries_mut(&mut object, "vin", &tx.txid)? {
            for input in vin.iter_mut() {
                let input = as_object(input, "vin", &tx.txid)?;
                if options.no_script_sig {
                    input.remove("scriptSig");
                } else if options.no_asm {
                    remove_nested(input, "scriptSig", "asm");
                }
            }
        }

        if let Some(vout) = entries_mut(&mut object, "vout", &tx.txid)? {
            if !include_immature_bts {
                vout.retain(|output| !is_immature_backward_transfer(output));
            }
            for output in vout.iter_mut() {
                let output = as_object(output, "vout", &tx.txid)?;
                if options.no_asm {
                    remove_nested(output, "scriptPubKey", "asm");
                }
                if options.no_spent {
                    for field in SPENT_FIELDS {
                        output.remove(field);
                    }
                }
            }
        }

        Ok(Value::Object(object))
    }
}

#[async_trait]
impl TransactionTransformer for InsightTransactionRenderer {
    async fn transform_transaction(
        &self,
        tx: &RawTransaction,
        include_immature_bts: bool,
        options: &RenderOptions,
    ) -> Result<Value> {
        self.render(tx, include_immature_bts, options)
    }
}

fn entries_mut<'a>(object: &'a mut Map<String, Value>, key: &str, txid: &str) -> Result<Option<&'a mut Vec<Value>>> {
    match object.get_mut(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(entries)) => Ok(Some(entries)),
        Some(_) => Err(ExplorerError::TransformationFailed {
            txid: txid.to_string(),
            message: format!("{} is not an array", key),
        }),
    }
}

fn as_object<'a>(value: &'a mut Value, key: &str, txid: &str) -> Result<&'a mut Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| ExplorerError::TransformationFailed {
        txid: txid.to_string(),
        message: format!("{} entry is not an object", key),
    })
}

fn remove_nested(object: &mut Map<String, Value>, parent: &str, field: &str) {
    if let Some(Value::Object(inner)) = object.get_mut(parent) {
        inner.remove(field);
    }
}

fn is_immature_backward_transfer(output: &Value) -> bool {
    output.get("backwardTransfer").and_then(Value::as_bool) == Some(true)
        && output.get("mature").and_then(Value::as_bool) == Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(value: Value) -> RawTransaction {
        serde_json::from_value(value).unwrap()
    }

    fn sample() -> RawTransaction {
        tx(json!({
            "txid": "aa",
            "blockheight": 95,
            "vin": [{"txid": "prev", "vout": 0, "scriptSig": {"asm": "3045", "hex": "4830"}}],
            "vout": [
                {"value": "1.0", "n": 0, "scriptPubKey": {"asm": "OP_DUP", "hex": "76a9"}, "spentTxId": "bb", "spentIndex": 1, "spentHeight": 99},
                {"value": "0.5", "n": 1, "scriptPubKey": {"asm": "OP_DUP", "hex": "76a9"}, "backwardTransfer": true, "mature": false},
                {"value": "0.2", "n": 2, "scriptPubKey": {"asm": "OP_DUP", "hex": "76a9"}, "backwardTransfer": true, "mature": true}
            ]
        }))
    }

    async fn render(tx: &RawTransaction, include: bool, options: RenderOptions) -> Value {
        InsightTransactionRenderer::new(ChainHeight::new(100))
            .transform_transaction(tx, include, &options)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_confirmations_added() {
        let rendered = render(&sample(), true, RenderOptions::default()).await;
        assert_eq!(rendered["confirmations"], 6);
        assert_eq!(rendered["txid"], "aa");
        assert_eq!(rendered["vout"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_mempool_transaction_has_no_confirmations() {
        let rendered = render(&tx(json!({"txid": "cc", "vout": []})), true, RenderOptions::default()).await;
        assert_eq!(rendered["confirmations"], 0);
    }

    #[tokio::test]
    async fn test_immature_backward_transfers_hidden_by_default() {
        let rendered = render(&sample(), false, RenderOptions::default()).await;
        let vout = rendered["vout"].as_array().unwrap();
        assert_eq!(vout.len(), 2);
        assert_eq!(vout[1]["n"], 2);
    }

    #[tokio::test]
    async fn test_render_switches() {
        let options = RenderOptions {
            no_asm: true,
            no_script_sig: false,
            no_spent: true,
        };
        let rendered = render(&sample(), true, options).await;

        assert_eq!(rendered["vin"][0]["scriptSig"], json!({"hex": "4830"}));
        assert_eq!(rendered["vout"][0]["scriptPubKey"], json!({"hex": "76a9"}));
        assert!(rendered["vout"][0].get("spentTxId").is_none());
        assert!(rendered["vout"][0].get("spentHeight").is_none());

        let options = RenderOptions {
            no_script_sig: true,
            ..Default::default()
        };
        let rendered = render(&sample(), true, options).await;
        assert!(rendered["vin"][0].get("scriptSig").is_none());
        assert_eq!(rendered["vout"][0]["spentTxId"], "bb");
    }

    #[tokio::test]
    async fn test_malformed_outputs_fail() {
        let renderer = InsightTransactionRenderer::new(ChainHeight::new(1));
        let broken = tx(json!({"txid": "dd", "vout": "nope"}));

        match renderer.transform_transaction(&broken, true, &RenderOptions::default()).await {
            Err(ExplorerError::TransformationFailed { txid, .. }) => assert_eq!(txid, "dd"),
            other => panic!("expected transformation failure, got {:?}", other),
        }
    }
}
