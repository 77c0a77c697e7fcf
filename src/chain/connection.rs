use super::rpc::{HttpRpcClient, RpcClient, TxRequest};
use crate::errors::{RpcError, SwapError};
use alloy_primitives::Bytes;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Builds a client for one endpoint. Building must not touch the network.
pub trait RpcConnector: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, RpcError>;
}

#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl RpcConnector for HttpConnector {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, RpcError> {
        Ok(Arc::new(HttpRpcClient::new(endpoint.to_string(), self.timeout)?))
    }
}

/// A live node selected for one swap request. Passed explicitly to every component.
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn RpcClient>,
    chain_id: u64,
}

impl Debug for Connection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Connection({}, chain_id={})", self.client.endpoint(), self.chain_id)
    }
}

impl Connection {
    pub fn new(client: Arc<dyn RpcClient>, chain_id: u64) -> Self {
        Self { client, chain_id }
    }

    pub fn client(&self) -> &Arc<dyn RpcClient> {
        &self.client
    }

    pub fn endpoint(&self) -> &str {
        self.client.endpoint()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub async fn call_contract(&self, to: alloy_primitives::Address, data: impl Into<Bytes>) -> Result<Bytes, RpcError> {
        self.call_contract_at(to, data, None).await
    }

    /// Read against the state at the end of `block`; `None` is latest
    pub async fn call_contract_at(
        &self,
        to: alloy_primitives::Address,
        data: impl Into<Bytes>,
        block: Option<u64>,
    ) -> Result<Bytes, RpcError> {
        self.client.call(&TxRequest::call(to, data), block).await
    }
}

/// Try `primary` then each fallback in order; the first endpoint that reports a valid
/// (and, when configured, the expected) chain id wins. One pass, no retries.
pub async fn connect(
    connector: &dyn RpcConnector,
    primary: &str,
    fallbacks: &[String],
    expected_chain_id: Option<u64>,
) -> Result<Connection, SwapError> {
    let candidates = std::iter::once(primary).chain(fallbacks.iter().map(String::as_str));
    let mut attempted = 0;
    let mut last_error = String::from("no endpoints configured");

    for endpoint in candidates {
        attempted += 1;
        debug!("Trying RPC endpoint {}", endpoint);

        let client = match connector.connect(endpoint) {
            Ok(client) => client,
            Err(e) => {
                warn!("Endpoint {} rejected: {}", endpoint, e);
                last_error = e.to_string();
                continue;
            }
        };

        match client.chain_id().await {
            Ok(0) => {
                warn!("Endpoint {} reported chain id 0", endpoint);
                last_error = format!("{endpoint}: invalid chain id 0");
            }
            Ok(chain_id) if expected_chain_id.is_some_and(|expected| expected != chain_id) => {
                warn!("Endpoint {} is on chain {}, expected {:?}", endpoint, chain_id, expected_chain_id);
                last_error = format!("{endpoint}: chain id mismatch ({chain_id})");
            }
            Ok(chain_id) => {
                info!("Connected to {} (chain id {})", endpoint, chain_id);
                return Ok(Connection::new(client, chain_id));
            }
            Err(e) => {
                warn!("Endpoint {} unreachable: {}", endpoint, e);
                last_error = format!("{endpoint}: {e}");
            }
        }
    }

    Err(SwapError::AllEndpointsUnreachable { attempted, last_error })
}
