use super::report::SwapStage;
use super::transaction::{TransactionRecord, TxContext, TxKind};
use crate::chain::TxRequest;
use crate::chain::contracts::IERC20;
use crate::errors::SwapError;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::info;

/// Transfer swap proceeds from the signer to `recipient`
pub async fn forward(ctx: &TxContext<'_>, token: Address, amount: U256, recipient: Address) -> Result<TransactionRecord, SwapError> {
    info!("Forwarding {} of {} to {}", amount, token, recipient);
    let call = IERC20::transferCall { to: recipient, amount };
    ctx.submit(TxRequest::call(token, call.abi_encode()), TxKind::Remittance, SwapStage::Remittance).await
}
