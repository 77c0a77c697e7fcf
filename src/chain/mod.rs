/// Chain Access Layer
///
/// Everything that talks to a node:
/// - endpoint selection with ordered fallbacks (`connection`)
/// - JSON-RPC transport and receipt polling (`rpc`)
/// - broker, exchange provider and ERC20 ABIs (`contracts`)
/// - the live exchange directory (`exchanges`)
/// - the wallet capability (`signer`)

pub mod config;
pub mod connection;
pub mod contracts;
pub mod exchanges;
pub mod rpc;
pub mod signer;

#[cfg(test)]
pub(crate) mod mock_chain;

pub use config::EngineConfig;
pub use connection::{Connection, HttpConnector, RpcConnector, connect};
pub use exchanges::list_exchanges;
pub use rpc::{HttpRpcClient, RpcClient, TxReceipt, TxRequest};
pub use signer::{NodeSigner, Signer, SignerError};
