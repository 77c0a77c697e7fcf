use super::report::SwapStage;
use crate::chain::{Connection, EngineConfig, Signer, TxRequest};
use crate::errors::SwapError;
use alloy_primitives::B256;
use alloy_sol_types::{Revert, SolError, decode_revert_reason};
use serde::Serialize;
use std::time::Duration;
use strum_macros::Display;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum TxKind {
    Approval,
    Swap,
    Remittance,
}

/// Set from the chain's receipt only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Reverted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionRecord {
    pub hash: B256,
    pub kind: TxKind,
    pub stage: SwapStage,
    pub status: TxStatus,
    pub block_number: Option<u64>,
    pub revert_reason: Option<String>,
}

impl TransactionRecord {
    fn pending(hash: B256, kind: TxKind, stage: SwapStage) -> Self {
        Self { hash, kind, stage, status: TxStatus::Pending, block_number: None, revert_reason: None }
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == TxStatus::Confirmed
    }

    /// Error describing a reverted record
    pub fn revert_error(&self) -> SwapError {
        SwapError::Reverted { hash: self.hash, reason: self.revert_reason.clone() }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl ReceiptPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self { poll_interval: config.receipt_poll_interval(), timeout: config.receipt_timeout() }
    }
}

/// Everything needed to put a transaction on chain for one request
pub struct TxContext<'a> {
    pub connection: &'a Connection,
    pub signer: &'a dyn Signer,
    pub policy: ReceiptPolicy,
}

impl<'a> TxContext<'a> {
    pub fn new(connection: &'a Connection, signer: &'a dyn Signer, policy: ReceiptPolicy) -> Self {
        Self { connection, signer, policy }
    }

    /// Submit through the signer and block until one receipt is observed or the wait times out.
    /// `Err` only when nothing was submitted.
    pub async fn submit(&self, tx: TxRequest, kind: TxKind, stage: SwapStage) -> Result<TransactionRecord, SwapError> {
        let tx = tx.with_from(self.signer.address());
        let hash = self.signer.send_transaction(tx.clone()).await?;
        info!("Submitted {} transaction {} for {}", kind, hash, stage);

        let mut record = TransactionRecord::pending(hash, kind, stage);
        let Some(receipt) =
            self.connection.client().wait_for_receipt(hash, self.policy.poll_interval, self.policy.timeout).await
        else {
            warn!("No receipt for {} after {:?}, leaving it pending", hash, self.policy.timeout);
            return Ok(record);
        };

        record.block_number = Some(receipt.block_number);
        if receipt.success {
            info!("{} transaction {} confirmed in block {}", kind, hash, receipt.block_number);
            record.status = TxStatus::Confirmed;
        } else {
            record.status = TxStatus::Reverted;
            record.revert_reason = self.replay_revert_reason(&tx, receipt.block_number).await;
            warn!(
                "{} transaction {} reverted: {}",
                kind,
                hash,
                record.revert_reason.as_deref().unwrap_or("no reason returned")
            );
        }
        Ok(record)
    }

    /// Re-run a reverted transaction as a call at its block to recover the reason string
    async fn replay_revert_reason(&self, tx: &TxRequest, block_number: u64) -> Option<String> {
        match self.connection.client().call(tx, Some(block_number)).await {
            Ok(_) => None,
            Err(e) => e.revert_data().and_then(|data| decode_reason(data)),
        }
    }
}

fn decode_reason(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    match Revert::abi_decode(data) {
        Ok(revert) => Some(revert.reason),
        Err(_) => decode_revert_reason(data),
    }
}
