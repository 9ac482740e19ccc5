use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::IndexError;
use crate::index::service::{HistoryOptions, IndexService, SummaryOptions, UtxoOptions};
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{Address, RawAddressSummary, RawHistory, RawUtxo};

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for the ledger indexing service
#[derive(Clone)]
pub struct RpcIndexClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
}

impl RpcIndexClient {
    pub fn new(endpoint: String, timeout_seconds: u64) -> Result<Self, IndexError> {
        let context = LogContext::new("index_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(timeout_seconds));
        context.info("Initializing index client");

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            timeout_seconds,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Vec<Value>) -> Result<T, IndexError> {
        let monitor = PerformanceMonitor::new("index_call")
            .with_metadata("method", json!(method));

        let result = self.send(method, params).await;
        let duration = monitor.finish_with_result(&result);
        MetricsLogger::log_index_call(method, duration, result.is_ok());

        serde_json::from_value(result?).map_err(IndexError::Json)
    }

    async fn send(&self, method: &str, params: Vec<Value>) -> Result<Value, IndexError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: 1,
        };

        LogContext::new("index_client", "send")
            .with_metadata("method", json!(method))
            .trace(&format!("Sending index request: {}", method));

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IndexError::Timeout { seconds: self.timeout_seconds }
                } else if e.is_connect() {
                    IndexError::Connection(e.to_string())
                } else {
                    IndexError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;

        // Node-style RPC servers report method errors with a non-2xx status and a JSON body.
        let rpc_response: JsonRpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) if status.is_success() => return Err(IndexError::Json(e)),
            Err(_) => {
                return Err(IndexError::Connection(format!(
                    "HTTP error: {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                )))
            }
        };

        if let Some(error) = rpc_response.error {
            return Err(IndexError::Method {
                code: error.code,
                message: error.message,
            });
        }

        if !status.is_success() {
            return Err(IndexError::InvalidResponse(format!(
                "HTTP status {} without an error object",
                status.as_u16()
            )));
        }

        rpc_response
            .result
            .ok_or_else(|| IndexError::InvalidResponse("No result in response".to_string()))
    }
}

fn address_params(addresses: &[Address]) -> Value {
    Value::Array(addresses.iter().map(|a| json!(a.as_str())).collect())
}

#[async_trait]
impl IndexService for RpcIndexClient {
    async fn get_address_summary(
        &self,
        address: &Address,
        options: &SummaryOptions,
    ) -> Result<RawAddressSummary, IndexError> {
        let params = vec![json!(address.as_str()), serde_json::to_value(options)?];
        self.call("getaddresssummary", params).await
    }

    async fn get_address_unspent_outputs(
        &self,
        addresses: &[Address],
        options: &UtxoOptions,
    ) -> Result<Vec<RawUtxo>, IndexError> {
        let params = vec![address_params(addresses), serde_json::to_value(options)?];
        self.call("getaddressunspentoutputs", params).await
    }

    async fn get_address_history(
        &self,
        addresses: &[Address],
        options: &HistoryOptions,
    ) -> Result<RawHistory, IndexError> {
        let params = vec![address_params(addresses), serde_json::to_value(options)?];
        self.call("getaddresshistory", params).await
    }

    async fn get_best_height(&self) -> Result<i64, IndexError> {
        let height: i64 = self.call("getblockcount", vec![]).await?;
        LogContext::new("index_client", "get_best_height")
            .with_height(height)
            .trace(&format!("Index reports height {}", height));
        Ok(height)
    }
}
