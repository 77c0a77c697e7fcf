/// Logic Layer - Routing and Quoting
///
/// This layer is responsible for:
/// - Core swap types: exchanges, paths, quotes and requests
/// - Asset graph over one exchange directory snapshot
/// - Deterministic resolution of direct and two-leg routes
/// - Read-only pricing of a path through the broker
///
/// Nothing here submits transactions; the execution layer consumes its quotes.

pub mod exchange_graph;
pub mod path_resolver;
pub mod quote_engine;
pub mod types;

pub use exchange_graph::{ExchangeGraph, FastHashMap};
pub use path_resolver::{PathResolver, find_path};
pub use quote_engine::QuoteEngine;
pub use types::{ExchangePair, LegQuote, PathLeg, Quote, SLIPPAGE_DENOMINATOR, SwapRequest, TradablePath, min_amount_out};
