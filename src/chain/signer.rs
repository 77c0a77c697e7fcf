use super::rpc::{RpcClient, TxRequest};
use crate::errors::RpcError;
use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    #[error("signer rejected transaction: {0}")]
    Rejected(String),
    #[error("transaction sender {requested} does not match signer {signer}")]
    WrongSender { requested: Address, signer: Address },
    #[error("signer transport error: {0}")]
    Rpc(#[from] RpcError),
}

/// Wallet capability. Holds the keys; the engine only hands it unsigned requests.
#[async_trait]
pub trait Signer: Send + Sync {
    fn address(&self) -> Address;

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, SignerError>;
}

/// Signs with an account managed by the node (`eth_sendTransaction`)
pub struct NodeSigner {
    address: Address,
    client: Arc<dyn RpcClient>,
}

impl NodeSigner {
    pub fn new(address: Address, client: Arc<dyn RpcClient>) -> Self {
        Self { address, client }
    }
}

#[async_trait]
impl Signer for NodeSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256, SignerError> {
        let tx = match tx.from {
            Some(from) if from != self.address => return Err(SignerError::WrongSender { requested: from, signer: self.address }),
            _ => tx.with_from(self.address),
        };
        let hash = self.client.send_transaction(&tx).await?;
        debug!("Node signer {} submitted {}", self.address, hash);
        Ok(hash)
    }
}
