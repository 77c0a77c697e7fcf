use crate::chain::signer::SignerError;
use crate::execution::state::SwapState;
use alloy_primitives::{Address, B256, Bytes, U256};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("rpc error {code}: {message}")]
    JsonRpc { code: i64, message: String, data: Option<Bytes> },
    #[error("missing result in RPC response")]
    MissingResult,
    #[error("decode error: {0}")]
    Decode(String),
}

impl RpcError {
    /// Revert payload attached to an `eth_call` error, if the node returned one.
    pub fn revert_data(&self) -> Option<&Bytes> {
        match self {
            RpcError::JsonRpc { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

impl From<alloy_sol_types::Error> for RpcError {
    fn from(error: alloy_sol_types::Error) -> Self {
        Self::Decode(error.to_string())
    }
}

/// Every terminal failure of a swap request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SwapError {
    #[error("invalid swap request: {0}")]
    InvalidRequest(String),

    // Connectivity
    #[error("all endpoints unreachable ({attempted} tried, last error: {last_error})")]
    AllEndpointsUnreachable { attempted: usize, last_error: String },

    // Quoting
    #[error("exchange directory unavailable: {0}")]
    ExchangeDirectory(String),
    #[error("no exchanges registered")]
    NoExchanges,
    #[error("no route available from {from} to {to}")]
    NoRoute { from: Address, to: Address },
    #[error("unsupported path length {0}")]
    UnsupportedPathLength(usize),
    #[error("quote failed: {0}")]
    Quote(String),

    // Transactions
    #[error("transaction {hash} reverted: {}", .reason.as_deref().unwrap_or("no reason returned"))]
    Reverted { hash: B256, reason: Option<String> },
    #[error("leg {leg} produced no output")]
    EmptyLegOutput { leg: usize },
    #[error("realized output {realized} is below the quoted minimum {minimum}")]
    BelowQuotedMinimum { realized: U256, minimum: U256 },
    #[error(transparent)]
    Signer(#[from] SignerError),
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("illegal state transition {from} -> {to}")]
    IllegalTransition { from: SwapState, to: SwapState },
}

impl SwapError {
    /// Failures raised before any transaction could have been submitted.
    pub fn is_pre_transactional(&self) -> bool {
        matches!(
            self,
            SwapError::InvalidRequest(_)
                | SwapError::AllEndpointsUnreachable { .. }
                | SwapError::ExchangeDirectory(_)
                | SwapError::NoExchanges
                | SwapError::NoRoute { .. }
                | SwapError::UnsupportedPathLength(_)
                | SwapError::Quote(_)
        )
    }
}
