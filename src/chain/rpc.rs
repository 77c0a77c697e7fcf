use crate::errors::RpcError;
use alloy_primitives::{Address, B256, Bytes, U64, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// Transaction or call as sent to the node. `from` is required for writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

impl TxRequest {
    pub fn call(to: Address, data: impl Into<Bytes>) -> Self {
        Self { from: None, to, data: data.into(), value: None }
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    status: Option<U64>,
}

impl From<RawReceipt> for TxReceipt {
    fn from(raw: RawReceipt) -> Self {
        Self {
            transaction_hash: raw.transaction_hash,
            block_number: raw.block_number.map(|n| n.to::<u64>()).unwrap_or_default(),
            success: raw.status.is_some_and(|status| status == U64::from(1)),
        }
    }
}

/// The node operations the engine relies on.
#[async_trait]
pub trait RpcClient: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn chain_id(&self) -> Result<u64, RpcError>;

    /// Read-only `eth_call`. `block = None` means latest.
    async fn call(&self, tx: &TxRequest, block: Option<u64>) -> Result<Bytes, RpcError>;

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, RpcError>;

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError>;

    /// Poll until a receipt shows up or `timeout` elapses. Poll errors are not fatal:
    /// a submitted transaction stays pending until the chain says otherwise.
    async fn wait_for_receipt(&self, hash: B256, poll_interval: Duration, timeout: Duration) -> Option<TxReceipt> {
        let deadline = Instant::now() + timeout;
        loop {
            match self.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => return Some(receipt),
                Ok(None) => debug!("Receipt for {} not available yet", hash),
                Err(e) => warn!("Receipt poll for {} failed on {}: {}", hash, self.endpoint(), e),
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(poll_interval).await;
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// Plain JSON-RPC over HTTP
#[derive(Debug)]
pub struct HttpRpcClient {
    http_client: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    pub fn new(rpc_url: String, timeout: Duration) -> Result<Self, RpcError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self { http_client, rpc_url, next_id: AtomicU64::new(1) })
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, RpcError> {
        let request_body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let response = self
            .http_client
            .post(&self.rpc_url)
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let response: RpcResponse = response.json().await?;

        if let Some(error) = response.error {
            // Revert data is a hex string on geth-style nodes
            let data = error.data.as_ref().and_then(Value::as_str).and_then(|data| data.parse::<Bytes>().ok());
            return Err(RpcError::JsonRpc { code: error.code, message: error.message, data });
        }

        Ok(serde_json::from_value(response.result)?)
    }
}

fn block_param(block: Option<u64>) -> String {
    match block {
        Some(num) => format!("0x{:x}", num),
        None => "latest".to_string(),
    }
}

#[async_trait]
impl RpcClient for HttpRpcClient {
    fn endpoint(&self) -> &str {
        &self.rpc_url
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        let chain_id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(chain_id.to::<u64>())
    }

    async fn call(&self, tx: &TxRequest, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.request("eth_call", json!([tx, block_param(block)])).await
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, RpcError> {
        self.request("eth_sendTransaction", json!([tx])).await
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        let receipt: Option<RawReceipt> = self.request("eth_getTransactionReceipt", json!([hash])).await?;
        Ok(receipt.map(TxReceipt::from))
    }
}
