// Three-Layer Architecture
pub mod chain;      // Data Layer: endpoints, contracts, exchange directory, signer
pub mod logic;      // Logic Layer: routing and quoting
pub mod execution;  // Execution Layer: approvals, swaps, remittance, reporting

// Common utilities and types
pub mod errors;
pub mod utils;

// Re-export key components from each layer
pub use chain::{Connection, EngineConfig, HttpConnector, NodeSigner, RpcConnector, Signer, connect, list_exchanges};
pub use errors::{RpcError, SwapError};
pub use execution::{
    StageStatus, SwapEngine, SwapOutcome, SwapReport, SwapStage, SwapState, TransactionRecord, TxStatus,
};
pub use logic::{ExchangePair, PathResolver, Quote, QuoteEngine, SwapRequest, TradablePath, find_path};
pub use utils::{TokenAsset, TokenAssetWrapper, TokenRegistry};
