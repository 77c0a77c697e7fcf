use super::types::ExchangePair;
use crate::utils::TokenAssetWrapper;
use ahash::RandomState;
use alloy_primitives::Address;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

pub type FastHasher = RandomState;
/// FastHashMap using ahash
pub type FastHashMap<K, V> = HashMap<K, V, FastHasher>;

/// Undirected asset graph of one exchange directory snapshot. Nodes are assets, an edge
/// carries the directory indices of every venue trading that asset pair, ascending.
#[derive(Debug, Clone, Default)]
pub struct ExchangeGraph {
    graph: UnGraph<TokenAssetWrapper, Vec<usize>, usize>,
    token_index: FastHashMap<Address, NodeIndex<usize>>,
}

impl ExchangeGraph {
    pub fn new() -> Self {
        Self { graph: UnGraph::default(), token_index: FastHashMap::default() }
    }

    pub fn from_exchanges(exchanges: &[ExchangePair]) -> Self {
        let mut graph = Self::new();
        for (idx, exchange) in exchanges.iter().enumerate() {
            graph.add_exchange(idx, exchange);
        }
        graph
    }

    fn add_or_get_token_idx(&mut self, token: &TokenAssetWrapper) -> NodeIndex<usize> {
        *self.token_index.entry(token.get_address()).or_insert_with(|| self.graph.add_node(token.clone()))
    }

    // Indices must be added in ascending order to keep edge weights sorted.
    fn add_exchange(&mut self, idx: usize, exchange: &ExchangePair) {
        let node_a = self.add_or_get_token_idx(&exchange.assets[0]);
        let node_b = self.add_or_get_token_idx(&exchange.assets[1]);

        if let Some(edge_index) = self.graph.find_edge(node_a, node_b) {
            if let Some(venues) = self.graph.edge_weight_mut(edge_index) {
                venues.push(idx);
            }
        } else {
            self.graph.add_edge(node_a, node_b, vec![idx]);
        }
    }

    pub fn contains_token(&self, token: Address) -> bool {
        self.token_index.contains_key(&token)
    }

    pub fn token_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Venues trading `a` against `b`, in directory order
    pub fn exchanges_between(&self, a: Address, b: Address) -> &[usize] {
        let (Some(node_a), Some(node_b)) = (self.token_index.get(&a), self.token_index.get(&b)) else {
            return &[];
        };
        self.graph.find_edge(*node_a, *node_b).and_then(|edge| self.graph.edge_weight(edge)).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every venue with `token` on one side, in directory order
    pub fn exchanges_touching(&self, token: Address) -> Vec<usize> {
        let Some(node) = self.token_index.get(&token) else {
            return Vec::new();
        };
        let mut venues = self.graph.edges(*node).flat_map(|edge| edge.weight().iter().copied()).collect::<Vec<_>>();
        venues.sort_unstable();
        venues
    }
}
