//! JSON-RPC transport
//!
//! Thin client over the node's JSON-RPC API. Reads never go through the
//! wallet: they use the configured endpoint, so they work with no wallet
//! connected or with a wallet on the wrong network.

use crate::{Error, Result};
use async_trait::async_trait;
use ethereum_types::{Address, U64};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use skyblocks_core::TxHash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Something that can answer JSON-RPC requests for the ledger's network
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Send one request and return its `result` member
    async fn request(&self, method: &str, params: Value) -> Result<Value>;
}

/// HTTP JSON-RPC 2.0 client
pub struct JsonRpcClient {
    rpc_url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_default(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }
}

#[async_trait]
impl LedgerTransport for JsonRpcClient {
    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp = self.http.post(&self.rpc_url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(Error::NetworkFetch(format!("HTTP {}", resp.status())));
        }
        let envelope: Value = resp.json().await?;
        into_result(envelope)
    }
}

/// Unwrap a JSON-RPC response envelope
fn into_result(mut envelope: Value) -> Result<Value> {
    if let Some(error) = envelope.get("error") {
        return Err(Error::Rpc {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        });
    }
    envelope
        .get_mut("result")
        .map(Value::take)
        .ok_or_else(|| Error::Decode("missing result in RPC response".into()))
}

/// The parts of a transaction receipt the submitter looks at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: TxHash,
    /// `None` while the node reports the transaction as not yet included
    pub block_number: Option<U64>,
    /// `1` success, `0` reverted
    pub status: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U64>,
}

impl TransactionReceipt {
    pub fn is_included(&self) -> bool {
        self.block_number.is_some()
    }

    pub fn succeeded(&self) -> bool {
        self.status == Some(U64::one())
    }
}

/// `eth_call` against the latest block, returning the raw return bytes
pub async fn eth_call(transport: &dyn LedgerTransport, to: Address, data: &[u8]) -> Result<Vec<u8>> {
    let params = json!([
        { "to": format!("{to:#x}"), "data": format!("0x{}", hex::encode(data)) },
        "latest",
    ]);
    let result = transport.request("eth_call", params).await?;
    let hex_str = result
        .as_str()
        .ok_or_else(|| Error::Decode(format!("eth_call returned non-string {result}")))?;
    hex::decode(hex_str.strip_prefix("0x").unwrap_or(hex_str))
        .map_err(|e| Error::Decode(format!("eth_call returned bad hex: {e}")))
}

/// `eth_getTransactionReceipt`; `None` until the node knows the transaction
pub async fn transaction_receipt(
    transport: &dyn LedgerTransport,
    hash: TxHash,
) -> Result<Option<TransactionReceipt>> {
    let result = transport
        .request("eth_getTransactionReceipt", json!([format!("{hash:#x}")]))
        .await?;
    if result.is_null() {
        return Ok(None);
    }
    serde_json::from_value(result)
        .map(Some)
        .map_err(|e| Error::Decode(format!("bad receipt: {e}")))
}
