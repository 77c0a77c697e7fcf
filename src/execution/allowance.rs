use super::report::SwapStage;
use super::transaction::{TransactionRecord, TxContext, TxKind};
use crate::chain::TxRequest;
use crate::chain::contracts::{IERC20, erc20_allowance};
use crate::errors::SwapError;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

/// Allowance as read from the token right before a swap step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceState {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub current_allowance: U256,
}

impl AllowanceState {
    pub fn covers(&self, required: U256) -> bool {
        self.current_allowance >= required
    }
}

#[derive(Debug, Clone)]
pub enum AllowanceOutcome {
    /// Nothing submitted
    Sufficient(AllowanceState),
    /// Approval for exactly the required amount was submitted; check its status
    Submitted(TransactionRecord),
}

pub async fn read_allowance(ctx: &TxContext<'_>, token: Address, owner: Address, spender: Address) -> Result<AllowanceState, SwapError> {
    let current_allowance = erc20_allowance(ctx.connection, token, owner, spender).await?;
    Ok(AllowanceState { owner, spender, token, current_allowance })
}

/// Approve `spender` for `required` of `token` unless the current allowance already covers it.
/// Always reads the allowance fresh; never approves more than `required`.
pub async fn ensure_allowance(
    ctx: &TxContext<'_>,
    token: Address,
    owner: Address,
    spender: Address,
    required: U256,
    stage: SwapStage,
) -> Result<AllowanceOutcome, SwapError> {
    let state = read_allowance(ctx, token, owner, spender).await?;
    if state.covers(required) {
        debug!("Allowance {} of {} for {} covers {}", state.current_allowance, token, spender, required);
        return Ok(AllowanceOutcome::Sufficient(state));
    }

    info!("Approving {} of {} for {} (current {})", required, token, spender, state.current_allowance);
    let call = IERC20::approveCall { spender, amount: required };
    let record = ctx.submit(TxRequest::call(token, call.abi_encode()), TxKind::Approval, stage).await?;
    Ok(AllowanceOutcome::Submitted(record))
}
