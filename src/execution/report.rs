use super::state::SwapState;
use super::transaction::TransactionRecord;
use crate::errors::SwapError;
use crate::logic::{Quote, SwapRequest, TradablePath};
use alloy_primitives::{Address, B256, U256};
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Externally visible steps of a swap request, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumIter)]
pub enum SwapStage {
    #[strum(serialize = "quote")]
    Quote,
    #[strum(serialize = "approval-1")]
    Approval1,
    #[strum(serialize = "swap-1")]
    Swap1,
    #[strum(serialize = "approval-2")]
    Approval2,
    #[strum(serialize = "swap-2")]
    Swap2,
    #[strum(serialize = "remittance")]
    Remittance,
}

impl SwapStage {
    /// Approval stage of the 1-based `leg`
    pub fn approval(leg: usize) -> SwapStage {
        if leg == 1 { SwapStage::Approval1 } else { SwapStage::Approval2 }
    }

    /// Swap stage of the 1-based `leg`
    pub fn swap(leg: usize) -> SwapStage {
        if leg == 1 { SwapStage::Swap1 } else { SwapStage::Swap2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum StageStatus {
    NotRun,
    /// Not needed: allowance already sufficient, single-leg path or no distinct recipient
    Skipped,
    Succeeded,
    Failed,
    /// Submitted, receipt never observed
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    pub stage: SwapStage,
    pub status: StageStatus,
}

#[derive(Debug, Clone)]
pub enum SwapOutcome {
    /// Every requested step confirmed
    Success,
    /// Swap confirmed, proceeds still with the sender
    ForwardingFailed { error: SwapError },
    /// First leg confirmed, second leg did not: the sender holds the intermediate asset
    IntermediateHeld { stage: SwapStage, token: Address, amount: U256, error: SwapError },
    Failed { stage: SwapStage, error: SwapError },
    /// A submitted transaction never produced a receipt; neither success nor failure
    Pending { stage: SwapStage, hash: B256 },
}

/// Terminal result of one swap request
#[derive(Debug, Clone)]
pub struct SwapReport {
    pub request: SwapRequest,
    pub path: Option<TradablePath>,
    pub quote: Option<Quote>,
    /// Submitted transactions in submission order
    pub transactions: Vec<TransactionRecord>,
    pub stages: Vec<StageRecord>,
    /// Realized output of the final leg, in the target asset
    pub amount_out: Option<U256>,
    pub recipient: Address,
    pub final_state: SwapState,
    pub outcome: SwapOutcome,
}

impl SwapReport {
    pub(crate) fn new(request: SwapRequest) -> Self {
        let recipient = request.recipient();
        Self {
            request,
            path: None,
            quote: None,
            transactions: Vec::new(),
            stages: SwapStage::iter().map(|stage| StageRecord { stage, status: StageStatus::NotRun }).collect(),
            amount_out: None,
            recipient,
            final_state: SwapState::Idle,
            outcome: SwapOutcome::Success,
        }
    }

    pub(crate) fn set_stage(&mut self, stage: SwapStage, status: StageStatus) {
        if let Some(record) = self.stages.iter_mut().find(|record| record.stage == stage) {
            record.status = status;
        }
    }

    pub fn stage(&self, stage: SwapStage) -> StageStatus {
        self.stages.iter().find(|record| record.stage == stage).map(|record| record.status).unwrap_or(StageStatus::NotRun)
    }

    /// Every swap leg confirmed, regardless of forwarding
    pub fn swap_succeeded(&self) -> bool {
        match &self.outcome {
            SwapOutcome::Success | SwapOutcome::ForwardingFailed { .. } => true,
            SwapOutcome::Pending { stage, .. } => *stage == SwapStage::Remittance,
            _ => false,
        }
    }

    /// `None` when no forwarding was requested
    pub fn forwarding_succeeded(&self) -> Option<bool> {
        match self.stage(SwapStage::Remittance) {
            StageStatus::Skipped => None,
            StageStatus::NotRun => self.request.needs_forwarding().then_some(false),
            status => Some(status == StageStatus::Succeeded),
        }
    }

    pub fn error(&self) -> Option<&SwapError> {
        match &self.outcome {
            SwapOutcome::ForwardingFailed { error }
            | SwapOutcome::IntermediateHeld { error, .. }
            | SwapOutcome::Failed { error, .. } => Some(error),
            SwapOutcome::Success | SwapOutcome::Pending { .. } => None,
        }
    }

    pub fn failed_stage(&self) -> Option<SwapStage> {
        self.stages.iter().find(|record| record.status == StageStatus::Failed).map(|record| record.stage)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.outcome, SwapOutcome::Pending { .. })
    }
}
