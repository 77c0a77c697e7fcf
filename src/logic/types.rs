use crate::errors::SwapError;
use crate::utils::TokenAssetWrapper;
use alloy_primitives::{Address, B256, U256};
use serde::Serialize;
use std::fmt::{Display, Formatter};

/// Exclusive upper bound of the slippage tolerance.
pub const SLIPPAGE_DENOMINATOR: u32 = 100;

/// A bidirectional trading venue registered with the broker
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct ExchangePair {
    pub id: B256,
    pub provider_address: Address,
    pub assets: [TokenAssetWrapper; 2],
}

impl Display for ExchangePair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Exchange({}/{})@{:#}", self.assets[0].get_symbol(), self.assets[1].get_symbol(), self.id)
    }
}

impl ExchangePair {
    pub fn new(id: B256, provider_address: Address, assets: [TokenAssetWrapper; 2]) -> Self {
        Self { id, provider_address, assets }
    }

    pub fn contains(&self, asset: Address) -> bool {
        self.assets.iter().any(|token| token.get_address() == asset)
    }

    /// The asset on the other side of `asset`, if `asset` is part of this pair
    pub fn other(&self, asset: Address) -> Option<&TokenAssetWrapper> {
        if self.assets[0].get_address() == asset {
            Some(&self.assets[1])
        } else if self.assets[1].get_address() == asset {
            Some(&self.assets[0])
        } else {
            None
        }
    }

    /// True when the pair trades exactly `a` against `b`, in either order
    pub fn connects(&self, a: Address, b: Address) -> bool {
        a != b && self.contains(a) && self.contains(b)
    }
}

/// One hop of a path: swap `token_in` for `token_out` on `exchange`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PathLeg {
    pub exchange: ExchangePair,
    pub token_in: TokenAssetWrapper,
    pub token_out: TokenAssetWrapper,
}

/// Ordered route of one or two exchanges from the source to the target asset.
/// Built per request, never cached.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TradablePath {
    legs: Vec<PathLeg>,
}

impl Display for TradablePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbols = self.tokens().iter().map(|t| t.get_symbol().to_string()).collect::<Vec<_>>();
        write!(f, "TradablePath({})", symbols.join(" -> "))
    }
}

impl TradablePath {
    pub const MAX_LEGS: usize = 2;

    /// Validate that the legs chain together and that there are one or two of them
    pub fn new(legs: Vec<PathLeg>) -> Result<Self, SwapError> {
        if legs.is_empty() || legs.len() > Self::MAX_LEGS {
            return Err(SwapError::UnsupportedPathLength(legs.len()));
        }
        for leg in &legs {
            if !leg.exchange.connects(leg.token_in.get_address(), leg.token_out.get_address()) {
                return Err(SwapError::Quote(format!("{} does not trade {} for {}", leg.exchange, leg.token_in, leg.token_out)));
            }
        }
        for window in legs.windows(2) {
            if window[0].token_out != window[1].token_in {
                return Err(SwapError::Quote(format!("path legs are not connected at {}", window[0].token_out)));
            }
        }
        Ok(Self { legs })
    }

    pub fn direct(exchange: ExchangePair, from: TokenAssetWrapper, to: TokenAssetWrapper) -> Result<Self, SwapError> {
        Self::new(vec![PathLeg { exchange, token_in: from, token_out: to }])
    }

    pub fn two_hop(
        first: ExchangePair,
        second: ExchangePair,
        from: TokenAssetWrapper,
        intermediate: TokenAssetWrapper,
        to: TokenAssetWrapper,
    ) -> Result<Self, SwapError> {
        Self::new(vec![
            PathLeg { exchange: first, token_in: from, token_out: intermediate.clone() },
            PathLeg { exchange: second, token_in: intermediate, token_out: to },
        ])
    }

    pub fn legs(&self) -> &[PathLeg] {
        &self.legs
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }

    pub fn from_asset(&self) -> &TokenAssetWrapper {
        &self.legs[0].token_in
    }

    pub fn to_asset(&self) -> &TokenAssetWrapper {
        &self.legs[self.legs.len() - 1].token_out
    }

    pub fn intermediate(&self) -> Option<&TokenAssetWrapper> {
        if self.legs.len() == 2 { Some(&self.legs[0].token_out) } else { None }
    }

    pub fn exchanges(&self) -> Vec<&ExchangePair> {
        self.legs.iter().map(|leg| &leg.exchange).collect()
    }

    pub fn tokens(&self) -> Vec<&TokenAssetWrapper> {
        let mut tokens = vec![&self.legs[0].token_in];
        tokens.extend(self.legs.iter().map(|leg| &leg.token_out));
        tokens
    }
}

/// `floor(amount_out * (100 - slippage) / 100)` in integer arithmetic.
/// Split as `100q + r` so the product cannot overflow.
pub fn min_amount_out(amount_out: U256, slippage_bps: u32) -> U256 {
    let denominator = U256::from(SLIPPAGE_DENOMINATOR);
    let keep = U256::from(SLIPPAGE_DENOMINATOR.saturating_sub(slippage_bps));
    let (quotient, remainder) = amount_out.div_rem(denominator);
    quotient * keep + (remainder * keep) / denominator
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegQuote {
    pub exchange: ExchangePair,
    pub token_in: Address,
    pub token_out: Address,
    pub amount_in: U256,
    pub amount_out: U256,
    pub min_amount_out: U256,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub path: TradablePath,
    pub amount_in: U256,
    pub amount_out: U256,
    pub slippage_bps: u32,
    pub min_amount_out: U256,
    /// Per-leg amounts; the intermediate amount of a two-leg path only appears here
    pub legs: Vec<LegQuote>,
}

/// One user-initiated swap. Single use: a failed request is never retried internally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SwapRequest {
    pub from_asset: TokenAssetWrapper,
    pub to_asset: TokenAssetWrapper,
    pub amount_in: U256,
    pub slippage_bps: u32,
    pub sender_address: Address,
    pub recipient_address: Option<Address>,
}

impl SwapRequest {
    pub fn new(
        from_asset: TokenAssetWrapper,
        to_asset: TokenAssetWrapper,
        amount_in: U256,
        slippage_bps: u32,
        sender_address: Address,
    ) -> Self {
        Self { from_asset, to_asset, amount_in, slippage_bps, sender_address, recipient_address: None }
    }

    pub fn with_recipient(mut self, recipient: Address) -> Self {
        self.recipient_address = Some(recipient);
        self
    }

    pub fn validate(&self) -> Result<(), SwapError> {
        if self.from_asset == self.to_asset {
            return Err(SwapError::InvalidRequest(format!("source and target asset are both {}", self.from_asset)));
        }
        if self.amount_in.is_zero() {
            return Err(SwapError::InvalidRequest("amount in must be positive".to_string()));
        }
        if self.slippage_bps >= SLIPPAGE_DENOMINATOR {
            return Err(SwapError::InvalidRequest(format!(
                "slippage {} must be below {}",
                self.slippage_bps, SLIPPAGE_DENOMINATOR
            )));
        }
        if self.sender_address.is_zero() {
            return Err(SwapError::InvalidRequest("sender address is zero".to_string()));
        }
        Ok(())
    }

    /// Defaults to the sender
    pub fn recipient(&self) -> Address {
        self.recipient_address.unwrap_or(self.sender_address)
    }

    pub fn needs_forwarding(&self) -> bool {
        self.recipient() != self.sender_address
    }
}
