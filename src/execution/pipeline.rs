use super::allowance::{AllowanceOutcome, ensure_allowance};
use super::remittance::forward;
use super::report::{StageStatus, SwapOutcome, SwapReport, SwapStage};
use super::sender_lock::SenderLocks;
use super::state::{SwapState, SwapStateMachine};
use super::swap_executor::SwapExecutor;
use super::transaction::{ReceiptPolicy, TransactionRecord, TxContext, TxStatus};
use crate::chain::{Connection, EngineConfig, HttpConnector, RpcConnector, Signer, connect, list_exchanges};
use crate::errors::SwapError;
use crate::logic::{Quote, QuoteEngine, SwapRequest, find_path};
use crate::utils::{TokenAssetWrapper, TokenRegistry};
use alloy_primitives::{Address, U256};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Entry point: runs swap requests end to end against a freshly selected endpoint.
///
/// Each request connects, reads the exchange directory, resolves and quotes its path, then
/// runs approval and swap for every leg strictly in sequence. Requests from the same sender
/// are serialized; nothing is ever retried.
pub struct SwapEngine {
    config: EngineConfig,
    connector: Arc<dyn RpcConnector>,
    registry: TokenRegistry,
    locks: SenderLocks,
}

impl SwapEngine {
    pub fn new(config: EngineConfig, connector: Arc<dyn RpcConnector>) -> Self {
        Self { config, connector, registry: TokenRegistry::celo_mainnet(), locks: SenderLocks::new() }
    }

    /// Plain HTTP endpoints with the configured timeout
    pub fn from_config(config: EngineConfig) -> Self {
        let connector = Arc::new(HttpConnector::new(config.http_timeout()));
        Self::new(config, connector)
    }

    pub fn with_registry(mut self, registry: TokenRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    async fn connect(&self) -> Result<Connection, SwapError> {
        connect(
            self.connector.as_ref(),
            &self.config.primary_rpc_url,
            &self.config.fallback_rpc_urls,
            self.config.expected_chain_id,
        )
        .await
    }

    async fn resolve_and_quote(&self, connection: &Connection, request: &SwapRequest) -> Result<Quote, SwapError> {
        let exchanges = list_exchanges(connection, self.config.broker_address, &self.registry).await?;
        let path = find_path(&exchanges, &request.from_asset, &request.to_asset)?;
        QuoteEngine::new(connection, self.config.broker_address).quote(&path, request.amount_in, request.slippage_bps).await
    }

    /// Price a request without submitting anything
    pub async fn quote(&self, request: &SwapRequest) -> Result<Quote, SwapError> {
        request.validate()?;
        let connection = self.connect().await?;
        self.resolve_and_quote(&connection, request).await
    }

    /// Indicative prices of `amount_in` of `from` in every target. Takes no sender lock.
    pub async fn display_quotes(
        &self,
        from: &TokenAssetWrapper,
        targets: &[TokenAssetWrapper],
        amount_in: U256,
    ) -> Result<Vec<(TokenAssetWrapper, Result<U256, SwapError>)>, SwapError> {
        let connection = self.connect().await?;
        let exchanges = list_exchanges(&connection, self.config.broker_address, &self.registry).await?;
        let quote_engine = QuoteEngine::new(&connection, self.config.broker_address);
        Ok(quote_engine.quote_many(&exchanges, from, targets, amount_in).await)
    }

    /// Run one request to a terminal report. Never panics on chain failures and never retries.
    pub async fn execute(&self, request: SwapRequest, signer: &dyn Signer) -> SwapReport {
        let mut run = SwapRun::new(request);

        if let Err(e) = run.check_request(signer) {
            return run.fail(SwapStage::Quote, e);
        }

        let _guard = self.locks.acquire(run.report.request.sender_address).await;
        info!(
            "Swap {} {} -> {} for {}",
            run.report.request.amount_in, run.report.request.from_asset, run.report.request.to_asset, run.report.request.sender_address
        );

        if let Err(e) = run.machine.transition(SwapState::Quoting) {
            return run.fail(SwapStage::Quote, e);
        }
        let quoted = match self.connect().await {
            Ok(connection) => self.resolve_and_quote(&connection, &run.report.request).await.map(|quote| (connection, quote)),
            Err(e) => Err(e),
        };
        let (connection, quote) = match quoted {
            Ok(quoted) => quoted,
            Err(e) => return run.fail(SwapStage::Quote, e),
        };
        run.report.set_stage(SwapStage::Quote, StageStatus::Succeeded);
        run.report.path = Some(quote.path.clone());
        run.machine.set_legs(quote.path.len());
        run.report.quote = Some(quote.clone());

        let ctx = TxContext::new(&connection, signer, ReceiptPolicy::from_config(&self.config));
        run.execute(&ctx, self.config.broker_address, &quote).await
    }
}

/// Why a request stopped before `Success`
enum Halt {
    Failed(SwapStage, SwapError),
    Pending(SwapStage, TransactionRecord),
}

/// Mutable state of one request in flight
struct SwapRun {
    report: SwapReport,
    machine: SwapStateMachine,
    /// Intermediate asset and amount held after a confirmed first leg of a two-leg path
    held: Option<(Address, U256)>,
}

impl SwapRun {
    fn new(request: SwapRequest) -> Self {
        Self { report: SwapReport::new(request), machine: SwapStateMachine::new(), held: None }
    }

    fn check_request(&self, signer: &dyn Signer) -> Result<(), SwapError> {
        let request = &self.report.request;
        request.validate()?;
        if signer.address() != request.sender_address {
            return Err(SwapError::InvalidRequest(format!(
                "signer {} cannot send for {}",
                signer.address(),
                request.sender_address
            )));
        }
        Ok(())
    }

    async fn execute(mut self, ctx: &TxContext<'_>, broker: Address, quote: &Quote) -> SwapReport {
        let result = self.run_legs(ctx, broker, quote).await;
        let amount_out = match result {
            Ok(amount_out) => amount_out,
            Err(Halt::Failed(stage, e)) => return self.fail(stage, e),
            Err(Halt::Pending(stage, record)) => return self.pending(stage, record),
        };
        self.report.amount_out = Some(amount_out);
        if amount_out < quote.min_amount_out {
            let error = SwapError::BelowQuotedMinimum { realized: amount_out, minimum: quote.min_amount_out };
            return self.fail(SwapStage::swap(quote.path.len()), error);
        }

        if let Err(e) = self.machine.transition(SwapState::Completing) {
            return self.fail(SwapStage::Remittance, e);
        }
        if self.report.request.needs_forwarding() {
            let token = self.report.request.to_asset.get_address();
            let recipient = self.report.recipient;
            match forward(ctx, token, amount_out, recipient).await {
                Ok(record) => match record.status {
                    TxStatus::Confirmed => self.record(SwapStage::Remittance, StageStatus::Succeeded, record),
                    TxStatus::Pending => return self.pending(SwapStage::Remittance, record),
                    TxStatus::Reverted => {
                        let e = record.revert_error();
                        self.record(SwapStage::Remittance, StageStatus::Failed, record);
                        return self.forwarding_failed(e);
                    }
                },
                Err(e) => {
                    self.report.set_stage(SwapStage::Remittance, StageStatus::Failed);
                    return self.forwarding_failed(e);
                }
            }
        } else {
            self.report.set_stage(SwapStage::Remittance, StageStatus::Skipped);
        }

        if let Err(e) = self.machine.transition(SwapState::Success) {
            return self.fail(SwapStage::Remittance, e);
        }
        info!("Swap for {} succeeded, {} of {} out", self.report.request.sender_address, amount_out, self.report.request.to_asset);
        self.report.outcome = SwapOutcome::Success;
        self.finish()
    }

    /// Approve and swap each leg in order. Returns the realized output of the last leg.
    async fn run_legs(&mut self, ctx: &TxContext<'_>, broker: Address, quote: &Quote) -> Result<U256, Halt> {
        let sender = self.report.request.sender_address;
        let executor = SwapExecutor::new(ctx, broker);
        let mut amount_in = quote.amount_in;

        for (idx, leg) in quote.path.legs().iter().enumerate() {
            let leg_number = idx + 1;
            let approval_stage = SwapStage::approval(leg_number);
            let swap_stage = SwapStage::swap(leg_number);

            self.transition(SwapState::Approving { leg: leg_number }, approval_stage)?;
            let min_out = leg_minimum(quote, idx, amount_in).map_err(|e| Halt::Failed(swap_stage, e))?;

            let token_in = leg.token_in.get_address();
            match ensure_allowance(ctx, token_in, sender, broker, amount_in, approval_stage).await {
                Ok(AllowanceOutcome::Sufficient(_)) => self.report.set_stage(approval_stage, StageStatus::Skipped),
                Ok(AllowanceOutcome::Submitted(record)) => self.settle(approval_stage, record)?,
                Err(e) => return Err(Halt::Failed(approval_stage, e)),
            }

            self.transition(SwapState::Swapping { leg: leg_number }, swap_stage)?;
            let step = executor
                .execute_step(&leg.exchange, token_in, leg.token_out.get_address(), amount_in, min_out, swap_stage)
                .await
                .map_err(|e| Halt::Failed(swap_stage, e))?;
            self.settle(swap_stage, step.record)?;

            if step.realized_out.is_zero() {
                return Err(Halt::Failed(swap_stage, SwapError::EmptyLegOutput { leg: leg_number }));
            }
            amount_in = step.realized_out;
            if leg_number < quote.path.len() {
                self.held = Some((leg.token_out.get_address(), amount_in));
            }
        }

        if quote.path.len() == 1 {
            self.report.set_stage(SwapStage::Approval2, StageStatus::Skipped);
            self.report.set_stage(SwapStage::Swap2, StageStatus::Skipped);
        }
        self.held = None;
        Ok(amount_in)
    }

    fn transition(&mut self, to: SwapState, stage: SwapStage) -> Result<(), Halt> {
        self.machine.transition(to).map_err(|e| Halt::Failed(stage, e))
    }

    fn record(&mut self, stage: SwapStage, status: StageStatus, record: TransactionRecord) {
        self.report.set_stage(stage, status);
        self.report.transactions.push(record);
    }

    /// Record a submitted transaction and continue only if it confirmed
    fn settle(&mut self, stage: SwapStage, record: TransactionRecord) -> Result<(), Halt> {
        match record.status {
            TxStatus::Confirmed => {
                self.record(stage, StageStatus::Succeeded, record);
                Ok(())
            }
            TxStatus::Reverted => {
                let e = record.revert_error();
                self.record(stage, StageStatus::Failed, record);
                Err(Halt::Failed(stage, e))
            }
            TxStatus::Pending => Err(Halt::Pending(stage, record)),
        }
    }

    fn fail(mut self, stage: SwapStage, error: SwapError) -> SwapReport {
        self.report.set_stage(stage, StageStatus::Failed);
        self.machine.fail();
        self.report.outcome = match self.held {
            Some((token, amount)) => {
                error!("Swap stopped at {} holding {} of {}: {}", stage, amount, token, error);
                SwapOutcome::IntermediateHeld { stage, token, amount, error }
            }
            None => {
                warn!("Swap failed at {}: {}", stage, error);
                SwapOutcome::Failed { stage, error }
            }
        };
        self.finish()
    }

    fn pending(mut self, stage: SwapStage, record: TransactionRecord) -> SwapReport {
        warn!("Swap pending at {}: no receipt for {}", stage, record.hash);
        let hash = record.hash;
        self.record(stage, StageStatus::Pending, record);
        self.report.outcome = SwapOutcome::Pending { stage, hash };
        self.finish()
    }

    /// The reverted transfer fails the request like any other revert. The swap itself already
    /// settled, which the outcome carries, so `swap_succeeded()` stays true on a `Failed` report.
    fn forwarding_failed(mut self, error: SwapError) -> SwapReport {
        warn!("Swap succeeded but forwarding to {} failed: {}", self.report.recipient, error);
        self.machine.fail();
        self.report.outcome = SwapOutcome::ForwardingFailed { error };
        self.finish()
    }

    fn finish(mut self) -> SwapReport {
        self.report.final_state = self.machine.state();
        self.report
    }
}

/// Minimum output of leg `idx`, always derived from the quote. A later leg scales its quoted
/// floor to what the previous leg actually delivered, and the last leg never accepts less than
/// the request's quoted minimum.
fn leg_minimum(quote: &Quote, idx: usize, amount_in: U256) -> Result<U256, SwapError> {
    let Some(leg_quote) = quote.legs.get(idx) else {
        return Err(SwapError::Quote(format!("missing quote for leg {}", idx + 1)));
    };
    let floor = if idx == 0 || leg_quote.amount_in.is_zero() {
        leg_quote.min_amount_out
    } else {
        leg_quote
            .min_amount_out
            .checked_mul(amount_in)
            .map(|scaled| scaled / leg_quote.amount_in)
            .ok_or_else(|| SwapError::Quote(format!("leg {} floor overflows", idx + 1)))?
    };
    if idx + 1 == quote.legs.len() {
        return Ok(floor.max(quote.min_amount_out));
    }
    Ok(floor)
}
