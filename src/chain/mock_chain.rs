//! In-memory chain for tests: a broker with exchange providers, an ERC20 ledger and
//! receipts, driven entirely through calldata so the real ABI paths are exercised.

use super::connection::{Connection, RpcConnector};
use super::contracts::{IBroker, IERC20, IExchangeProvider};
use super::rpc::{RpcClient, TxReceipt, TxRequest};
use crate::errors::RpcError;
use alloy_primitives::{Address, B256, Bytes, U256, keccak256};
use alloy_sol_types::{Revert, SolCall, SolError, SolValue};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MockTxKind {
    Approve { token: Address, spender: Address, amount: U256 },
    Swap { exchange_id: B256, token_in: Address, token_out: Address, amount_in: U256, min_amount_out: U256 },
    Transfer { token: Address, to: Address, amount: U256 },
    Unknown,
}

#[derive(Debug, Clone)]
pub(crate) struct SubmittedTx {
    pub hash: B256,
    pub from: Address,
    pub nonce: u64,
    pub kind: MockTxKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ChainEvent {
    Submitted(B256),
    ReceiptObserved(B256),
}

/// Applied right after the n-th swap is mined, while the sender waits for its receipt
#[derive(Debug, Clone)]
enum SwapHook {
    Reprice { id: B256, token_in: Address, token_out: Address, rate: (U256, U256) },
    Mint { token: Address, owner: Address, amount: U256 },
}

#[derive(Debug, Clone, Default)]
struct Ledger {
    // (token, owner)
    balances: HashMap<(Address, Address), U256>,
    // (token, owner, spender)
    allowances: HashMap<(Address, Address, Address), U256>,
}

#[derive(Default)]
struct ChainState {
    providers: Vec<Address>,
    exchanges: HashMap<Address, Vec<IExchangeProvider::Exchange>>,
    // (exchange, token_in, token_out) -> (numerator, denominator)
    quote_rates: HashMap<(B256, Address, Address), (U256, U256)>,
    execution_rates: HashMap<(B256, Address, Address), (U256, U256)>,
    broken_quotes: HashSet<B256>,
    ledger: Ledger,
    // ledger at the end of each block a transaction touched
    history: BTreeMap<u64, Ledger>,
    swap_hooks: Vec<(usize, SwapHook)>,
    nonces: HashMap<Address, u64>,
    tx_count: u64,
    block: u64,
    receipts: HashMap<B256, TxReceipt>,
    observed: HashSet<B256>,
    forced_reverts: HashMap<(Address, Bytes), String>,
    revert_approvals: bool,
    revert_transfers: bool,
    revert_swap_number: Option<usize>,
    stuck_swap_number: Option<usize>,
    swap_count: usize,
    receipt_latency: Option<Duration>,
    submitted: Vec<SubmittedTx>,
    events: Vec<ChainEvent>,
}

pub(crate) struct MockChain {
    chain_id: u64,
    reachable: bool,
    broker: Address,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub const BROKER: Address = Address::repeat_byte(0xbb);

    pub fn new(chain_id: u64) -> Arc<Self> {
        Arc::new(Self { chain_id, reachable: true, broker: Self::BROKER, state: Mutex::new(ChainState::default()) })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self { chain_id: 0, reachable: false, broker: Self::BROKER, state: Mutex::new(ChainState::default()) })
    }

    pub fn broker(&self) -> Address {
        self.broker
    }

    pub fn connection(self: &Arc<Self>) -> Connection {
        Connection::new(self.clone(), self.chain_id)
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_exchange(&self, provider: Address, id: B256, assets: Vec<Address>) {
        let mut state = self.state();
        if !state.providers.contains(&provider) {
            state.providers.push(provider);
        }
        state.exchanges.entry(provider).or_default().push(IExchangeProvider::Exchange { exchangeId: id, assets });
    }

    /// Venue between `a` and `b` quoting `b = a * num / den` and the inverse the other way
    pub fn add_pair(&self, provider: Address, id: B256, a: Address, b: Address, num: u64, den: u64) {
        self.add_exchange(provider, id, vec![a, b]);
        let mut state = self.state();
        state.quote_rates.insert((id, a, b), (U256::from(num), U256::from(den)));
        state.quote_rates.insert((id, b, a), (U256::from(den), U256::from(num)));
    }

    /// Price at execution time differs from the quote
    pub fn move_price(&self, id: B256, token_in: Address, token_out: Address, num: u64, den: u64) {
        self.state().execution_rates.insert((id, token_in, token_out), (U256::from(num), U256::from(den)));
    }

    pub fn break_quotes(&self, id: B256) {
        self.state().broken_quotes.insert(id);
    }

    pub fn mint(&self, token: Address, owner: Address, amount: U256) {
        *self.state().ledger.balances.entry((token, owner)).or_default() += amount;
    }

    pub fn set_allowance(&self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.state().ledger.allowances.insert((token, owner, spender), amount);
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> U256 {
        self.state().ledger.balances.get(&(token, owner)).copied().unwrap_or_default()
    }

    pub fn allowance_of(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state().ledger.allowances.get(&(token, owner, spender)).copied().unwrap_or_default()
    }

    pub fn revert_approvals(&self) {
        self.state().revert_approvals = true;
    }

    pub fn revert_transfers(&self) {
        self.state().revert_transfers = true;
    }

    /// The n-th swap (1-based) reverts
    pub fn revert_swap(&self, number: usize) {
        self.state().revert_swap_number = Some(number);
    }

    /// The n-th swap (1-based) never gets a receipt
    pub fn stick_swap(&self, number: usize) {
        self.state().stuck_swap_number = Some(number);
    }

    /// Every receipt lookup yields to the runtime for `latency` first
    pub fn slow_receipts(&self, latency: Duration) {
        self.state().receipt_latency = Some(latency);
    }

    /// Quote and execution rate of a venue change once the n-th swap is mined
    pub fn reprice_after_swap(&self, number: usize, id: B256, token_in: Address, token_out: Address, num: u64, den: u64) {
        let rate = (U256::from(num), U256::from(den));
        self.state().swap_hooks.push((number, SwapHook::Reprice { id, token_in, token_out, rate }));
    }

    /// An unrelated transfer lands with `owner` in the block after the n-th swap
    pub fn mint_after_swap(&self, number: usize, token: Address, owner: Address, amount: U256) {
        self.state().swap_hooks.push((number, SwapHook::Mint { token, owner, amount }));
    }

    pub fn submitted(&self) -> Vec<SubmittedTx> {
        self.state().submitted.clone()
    }

    pub fn position(&self, event: &ChainEvent) -> Option<usize> {
        self.state().events.iter().position(|e| e == event)
    }
}

fn classify(to: Address, data: &[u8]) -> MockTxKind {
    if let Ok(call) = IERC20::approveCall::abi_decode(data) {
        return MockTxKind::Approve { token: to, spender: call.spender, amount: call.amount };
    }
    if let Ok(call) = IERC20::transferCall::abi_decode(data) {
        return MockTxKind::Transfer { token: to, to: call.to, amount: call.amount };
    }
    if let Ok(call) = IBroker::swapInCall::abi_decode(data) {
        return MockTxKind::Swap {
            exchange_id: call.exchangeId,
            token_in: call.tokenIn,
            token_out: call.tokenOut,
            amount_in: call.amountIn,
            min_amount_out: call.amountOutMin,
        };
    }
    MockTxKind::Unknown
}

fn apply_rate(amount: U256, (num, den): (U256, U256)) -> U256 {
    amount * num / den
}

impl ChainState {
    fn ledger_at(&self, block: Option<u64>) -> &Ledger {
        block.and_then(|n| self.history.range(..=n).next_back()).map(|(_, ledger)| ledger).unwrap_or(&self.ledger)
    }

    fn run_swap_hooks(&mut self, number: usize) {
        let hooks = self.swap_hooks.iter().filter(|(n, _)| *n == number).map(|(_, hook)| hook.clone()).collect::<Vec<_>>();
        for hook in hooks {
            match hook {
                SwapHook::Reprice { id, token_in, token_out, rate } => {
                    self.quote_rates.insert((id, token_in, token_out), rate);
                    self.execution_rates.insert((id, token_in, token_out), rate);
                }
                SwapHook::Mint { token, owner, amount } => {
                    self.block += 1;
                    *self.ledger.balances.entry((token, owner)).or_default() += amount;
                    let snapshot = self.ledger.clone();
                    self.history.insert(self.block, snapshot);
                }
            }
        }
    }

    fn quote(&self, id: B256, token_in: Address, token_out: Address, amount_in: U256) -> Result<U256, String> {
        if self.broken_quotes.contains(&id) {
            return Err("no valid median".to_string());
        }
        let rate = self.quote_rates.get(&(id, token_in, token_out)).ok_or_else(|| "exchange not found".to_string())?;
        Ok(apply_rate(amount_in, *rate))
    }

    /// Run a state-changing call against `ledger`; `Err` is the revert reason
    fn execute(&self, ledger: &mut Ledger, broker: Address, from: Address, to: Address, data: &[u8]) -> Result<Bytes, String> {
        match classify(to, data) {
            MockTxKind::Approve { token, spender, amount } => {
                ledger.allowances.insert((token, from, spender), amount);
                Ok(true.abi_encode().into())
            }
            MockTxKind::Transfer { token, to: recipient, amount } => {
                let balance = ledger.balances.get(&(token, from)).copied().unwrap_or_default();
                if balance < amount {
                    return Err("ERC20: transfer amount exceeds balance".to_string());
                }
                ledger.balances.insert((token, from), balance - amount);
                *ledger.balances.entry((token, recipient)).or_default() += amount;
                Ok(true.abi_encode().into())
            }
            MockTxKind::Swap { exchange_id, token_in, token_out, amount_in, min_amount_out } if to == broker => {
                let rate = match self.execution_rates.get(&(exchange_id, token_in, token_out)) {
                    Some(rate) => *rate,
                    None => *self
                        .quote_rates
                        .get(&(exchange_id, token_in, token_out))
                        .ok_or_else(|| "exchange not found".to_string())?,
                };
                let allowance = ledger.allowances.get(&(token_in, from, broker)).copied().unwrap_or_default();
                if allowance < amount_in {
                    return Err("ERC20: insufficient allowance".to_string());
                }
                let balance = ledger.balances.get(&(token_in, from)).copied().unwrap_or_default();
                if balance < amount_in {
                    return Err("ERC20: transfer amount exceeds balance".to_string());
                }
                let amount_out = apply_rate(amount_in, rate);
                if amount_out < min_amount_out {
                    return Err("amountOutMin not met".to_string());
                }
                ledger.allowances.insert((token_in, from, broker), allowance - amount_in);
                ledger.balances.insert((token_in, from), balance - amount_in);
                *ledger.balances.entry((token_out, from)).or_default() += amount_out;
                Ok(amount_out.abi_encode().into())
            }
            _ => Err("unsupported call".to_string()),
        }
    }

    fn read(&self, broker: Address, from: Option<Address>, to: Address, data: &[u8], block: Option<u64>) -> Result<Bytes, String> {
        let ledger = self.ledger_at(block);
        if to == broker {
            if IBroker::getExchangeProvidersCall::abi_decode(data).is_ok() {
                return Ok(self.providers.abi_encode().into());
            }
            if let Ok(call) = IBroker::getAmountOutCall::abi_decode(data) {
                return self.quote(call.exchangeId, call.tokenIn, call.tokenOut, call.amountIn).map(|out| out.abi_encode().into());
            }
        }
        if let Some(exchanges) = self.exchanges.get(&to) {
            if IExchangeProvider::getExchangesCall::abi_decode(data).is_ok() {
                return Ok(exchanges.abi_encode().into());
            }
        }
        if let Ok(call) = IERC20::balanceOfCall::abi_decode(data) {
            return Ok(ledger.balances.get(&(to, call.owner)).copied().unwrap_or_default().abi_encode().into());
        }
        if let Ok(call) = IERC20::allowanceCall::abi_decode(data) {
            let allowance = ledger.allowances.get(&(to, call.owner, call.spender)).copied().unwrap_or_default();
            return Ok(allowance.abi_encode().into());
        }
        // Replay of a state-changing call
        let from = from.unwrap_or_default();
        if let Some(reason) = self.forced_reverts.get(&(to, Bytes::copy_from_slice(data))) {
            return Err(reason.clone());
        }
        let mut scratch = ledger.clone();
        self.execute(&mut scratch, broker, from, to, data)
    }
}

fn revert_error(reason: String) -> RpcError {
    let data = Revert { reason }.abi_encode();
    RpcError::JsonRpc { code: 3, message: "execution reverted".to_string(), data: Some(data.into()) }
}

fn unreachable_error() -> RpcError {
    RpcError::Transport("connection refused".to_string())
}

#[async_trait]
impl RpcClient for MockChain {
    fn endpoint(&self) -> &str {
        "mock://chain"
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        if !self.reachable {
            return Err(unreachable_error());
        }
        Ok(self.chain_id)
    }

    async fn call(&self, tx: &TxRequest, block: Option<u64>) -> Result<Bytes, RpcError> {
        if !self.reachable {
            return Err(unreachable_error());
        }
        self.state().read(self.broker, tx.from, tx.to, &tx.data, block).map_err(revert_error)
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, RpcError> {
        if !self.reachable {
            return Err(unreachable_error());
        }
        let from = tx.from.ok_or_else(|| RpcError::JsonRpc { code: -32000, message: "missing from".to_string(), data: None })?;

        let mut guard = self.state();
        let state = &mut *guard;
        state.tx_count += 1;
        state.history.insert(state.block, state.ledger.clone());
        state.block += 1;
        let nonce = {
            let nonce = state.nonces.entry(from).or_default();
            let current = *nonce;
            *nonce += 1;
            current
        };
        let hash = keccak256(state.tx_count.to_be_bytes());
        let kind = classify(tx.to, &tx.data);

        let mut stuck = false;
        let mut forced = None;
        let mut swap_number = None;
        match &kind {
            MockTxKind::Approve { .. } if state.revert_approvals => forced = Some("approve disabled".to_string()),
            MockTxKind::Transfer { .. } if state.revert_transfers => forced = Some("transfer blocked".to_string()),
            MockTxKind::Swap { .. } => {
                state.swap_count += 1;
                swap_number = Some(state.swap_count);
                if state.revert_swap_number == Some(state.swap_count) {
                    forced = Some("no valid median".to_string());
                }
                stuck = state.stuck_swap_number == Some(state.swap_count);
            }
            _ => {}
        }

        state.submitted.push(SubmittedTx { hash, from, nonce, kind });
        state.events.push(ChainEvent::Submitted(hash));

        if stuck {
            return Ok(hash);
        }

        let success = match forced {
            Some(reason) => {
                state.forced_reverts.insert((tx.to, tx.data.clone()), reason);
                false
            }
            None => {
                let mut scratch = state.ledger.clone();
                let result = state.execute(&mut scratch, self.broker, from, tx.to, &tx.data);
                if result.is_ok() {
                    state.ledger = scratch;
                }
                result.is_ok()
            }
        };
        let block_number = state.block;
        state.history.insert(block_number, state.ledger.clone());
        state.receipts.insert(hash, TxReceipt { transaction_hash: hash, block_number, success });
        if let Some(number) = swap_number {
            state.run_swap_hooks(number);
        }

        Ok(hash)
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        if !self.reachable {
            return Err(unreachable_error());
        }
        let latency = self.state().receipt_latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        let mut state = self.state();
        let receipt = state.receipts.get(&hash).copied();
        if receipt.is_some() && state.observed.insert(hash) {
            state.events.push(ChainEvent::ReceiptObserved(hash));
        }
        Ok(receipt)
    }
}

/// Maps endpoint urls to chains; unknown urls fail to connect
#[derive(Default)]
pub(crate) struct MockConnector {
    endpoints: HashMap<String, Arc<MockChain>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: &str, chain: Arc<MockChain>) -> Self {
        self.endpoints.insert(endpoint.to_string(), chain);
        self
    }
}

impl RpcConnector for MockConnector {
    fn connect(&self, endpoint: &str) -> Result<Arc<dyn RpcClient>, RpcError> {
        match self.endpoints.get(endpoint) {
            Some(chain) => Ok(Arc::new(NamedEndpoint { endpoint: endpoint.to_string(), chain: chain.clone() })),
            None => Err(RpcError::Transport(format!("unknown host {endpoint}"))),
        }
    }
}

/// Reports the url it was reached through
struct NamedEndpoint {
    endpoint: String,
    chain: Arc<MockChain>,
}

#[async_trait]
impl RpcClient for NamedEndpoint {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn chain_id(&self) -> Result<u64, RpcError> {
        self.chain.chain_id().await
    }

    async fn call(&self, tx: &TxRequest, block: Option<u64>) -> Result<Bytes, RpcError> {
        self.chain.call(tx, block).await
    }

    async fn send_transaction(&self, tx: &TxRequest) -> Result<B256, RpcError> {
        self.chain.send_transaction(tx).await
    }

    async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, RpcError> {
        self.chain.get_transaction_receipt(hash).await
    }
}
