use super::constants::CeloTokenAddress;
use super::token::{TokenAsset, TokenAssetWrapper};
use alloy_primitives::Address;
use std::collections::HashMap;
use std::sync::Arc;

/// Static, immutable set of known assets. The engine never learns assets from the chain;
/// venue assets missing here resolve to [`TokenAsset::unknown`].
#[derive(Debug, Clone, Default)]
pub struct TokenRegistry {
    by_address: HashMap<Address, TokenAssetWrapper>,
    // lowercase symbol -> address
    by_symbol: HashMap<String, Address>,
}

impl TokenRegistry {
    pub fn new<I: IntoIterator<Item = TokenAsset>>(tokens: I) -> Self {
        let mut registry = Self::default();
        for token in tokens {
            registry.by_symbol.insert(token.get_symbol().to_lowercase(), token.get_address());
            registry.by_address.insert(token.get_address(), Arc::new(token));
        }
        registry
    }

    pub fn celo_mainnet() -> Self {
        Self::new([
            TokenAsset::new(CeloTokenAddress::CELO, "CELO", 18),
            TokenAsset::new(CeloTokenAddress::CUSD, "cUSD", 18),
            TokenAsset::new(CeloTokenAddress::CEUR, "cEUR", 18),
            TokenAsset::new(CeloTokenAddress::CREAL, "cREAL", 18),
            TokenAsset::new(CeloTokenAddress::EXOF, "eXOF", 18),
            TokenAsset::new(CeloTokenAddress::CKES, "cKES", 18),
            TokenAsset::new(CeloTokenAddress::USDC, "USDC", 6),
            TokenAsset::new(CeloTokenAddress::USDT, "USDT", 6),
        ])
    }

    pub fn get_by_address(&self, address: &Address) -> Option<TokenAssetWrapper> {
        self.by_address.get(address).cloned()
    }

    pub fn get_by_symbol(&self, symbol: &str) -> Option<TokenAssetWrapper> {
        self.by_symbol.get(&symbol.to_lowercase()).and_then(|address| self.get_by_address(address))
    }

    /// Registry entry, or a placeholder asset for addresses the registry does not know.
    pub fn resolve(&self, address: Address) -> TokenAssetWrapper {
        self.get_by_address(&address).unwrap_or_else(|| Arc::new(TokenAsset::unknown(address)))
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}
