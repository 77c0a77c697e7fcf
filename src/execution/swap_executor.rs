use super::report::SwapStage;
use super::transaction::{TransactionRecord, TxContext, TxKind};
use crate::chain::TxRequest;
use crate::chain::contracts::{IBroker, erc20_balance_of};
use crate::errors::SwapError;
use crate::logic::ExchangePair;
use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use tracing::{debug, info};

/// One confirmed (or not) swap leg with the output the sender actually received
#[derive(Debug, Clone)]
pub struct StepResult {
    pub record: TransactionRecord,
    /// `balanceOf(token_out)` delta across the receipt's block; zero unless confirmed
    pub realized_out: U256,
}

/// Submits broker `swapIn` transactions for single legs.
///
/// The broker pays the output to `msg.sender`, so proceeds always land with the signer.
/// Sending them elsewhere is the remittance step's job.
pub struct SwapExecutor<'a> {
    ctx: &'a TxContext<'a>,
    broker: Address,
}

impl<'a> SwapExecutor<'a> {
    pub fn new(ctx: &'a TxContext<'a>, broker: Address) -> Self {
        Self { ctx, broker }
    }

    /// Swap `amount_in` of `token_in` for at least `min_amount_out` of `token_out` on `exchange`,
    /// blocking until the receipt is observed.
    pub async fn execute_step(
        &self,
        exchange: &ExchangePair,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
        min_amount_out: U256,
        stage: SwapStage,
    ) -> Result<StepResult, SwapError> {
        let call = IBroker::swapInCall {
            exchangeProvider: exchange.provider_address,
            exchangeId: exchange.id,
            tokenIn: token_in,
            tokenOut: token_out,
            amountIn: amount_in,
            amountOutMin: min_amount_out,
        };
        info!("Swapping {} of {} for >= {} of {} on {}", amount_in, token_in, min_amount_out, token_out, exchange);
        let record = self.ctx.submit(TxRequest::call(self.broker, call.abi_encode()), TxKind::Swap, stage).await?;

        let block = match record.block_number {
            Some(block) if record.is_confirmed() => block,
            _ => return Ok(StepResult { record, realized_out: U256::ZERO }),
        };

        // pinned to the blocks either side of the receipt
        let owner = self.ctx.signer.address();
        let balance_before = erc20_balance_of(self.ctx.connection, token_out, owner, Some(block.saturating_sub(1))).await?;
        let balance_after = erc20_balance_of(self.ctx.connection, token_out, owner, Some(block)).await?;
        let realized_out = balance_after.saturating_sub(balance_before);
        debug!("Leg {} realized {} of {}", stage, realized_out, token_out);
        Ok(StepResult { record, realized_out })
    }
}
