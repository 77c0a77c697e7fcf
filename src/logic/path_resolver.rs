use super::exchange_graph::ExchangeGraph;
use super::types::{ExchangePair, TradablePath};
use crate::errors::SwapError;
use crate::utils::TokenAssetWrapper;
use tracing::{debug, info};

/// Resolves routes of at most two legs over one exchange directory snapshot.
///
/// Resolution is deterministic for a given snapshot: a direct venue always wins, and ties
/// between venues go to the one listed first by the directory. Longer routes are
/// deliberately not searched.
pub struct PathResolver<'a> {
    exchanges: &'a [ExchangePair],
    graph: ExchangeGraph,
}

impl<'a> PathResolver<'a> {
    pub fn new(exchanges: &'a [ExchangePair]) -> Self {
        Self { exchanges, graph: ExchangeGraph::from_exchanges(exchanges) }
    }

    pub fn find_path(&self, from: &TokenAssetWrapper, to: &TokenAssetWrapper) -> Result<TradablePath, SwapError> {
        if from == to {
            return Err(SwapError::InvalidRequest(format!("cannot route {from} to itself")));
        }
        if !self.graph.contains_token(from.get_address()) || !self.graph.contains_token(to.get_address()) {
            debug!("{} or {} is not listed by any venue", from, to);
            return Err(SwapError::NoRoute { from: from.get_address(), to: to.get_address() });
        }

        if let Some(path) = self.find_direct(from, to)? {
            info!("Direct route {}", path);
            return Ok(path);
        }

        if let Some(path) = self.find_two_hop(from, to)? {
            info!("Two-leg route {}", path);
            return Ok(path);
        }

        debug!(
            "No route from {} to {} across {} venues and {} assets",
            from,
            to,
            self.exchanges.len(),
            self.graph.token_count()
        );
        Err(SwapError::NoRoute { from: from.get_address(), to: to.get_address() })
    }

    fn find_direct(&self, from: &TokenAssetWrapper, to: &TokenAssetWrapper) -> Result<Option<TradablePath>, SwapError> {
        let Some(&idx) = self.graph.exchanges_between(from.get_address(), to.get_address()).first() else {
            return Ok(None);
        };
        TradablePath::direct(self.exchanges[idx].clone(), from.clone(), to.clone()).map(Some)
    }

    /// First venue holding `from` (directory order) whose other asset also trades against `to`
    fn find_two_hop(&self, from: &TokenAssetWrapper, to: &TokenAssetWrapper) -> Result<Option<TradablePath>, SwapError> {
        for first_idx in self.graph.exchanges_touching(from.get_address()) {
            let first = &self.exchanges[first_idx];
            let Some(intermediate) = first.other(from.get_address()) else {
                continue;
            };
            if intermediate == to || intermediate == from {
                continue;
            }

            let Some(&second_idx) = self.graph.exchanges_between(intermediate.get_address(), to.get_address()).first() else {
                continue;
            };
            let second = &self.exchanges[second_idx];

            return TradablePath::two_hop(first.clone(), second.clone(), from.clone(), intermediate.clone(), to.clone()).map(Some);
        }
        Ok(None)
    }
}

/// Resolve a route on a fresh snapshot
pub fn find_path(exchanges: &[ExchangePair], from: &TokenAssetWrapper, to: &TokenAssetWrapper) -> Result<TradablePath, SwapError> {
    PathResolver::new(exchanges).find_path(from, to)
}
