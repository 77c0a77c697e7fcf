use alloy_primitives::U256;
use alloy_primitives::utils::{Unit, UnitsError, format_units, parse_units};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A tradable asset. Identity is the address only; `Address` compares raw bytes so
/// differently-cased hex renderings of the same address are equal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenAsset {
    address: Address,
    symbol: String,
    decimals: u8,
}

pub type TokenAssetWrapper = Arc<TokenAsset>;

impl Hash for TokenAsset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address.hash(state)
    }
}

impl PartialEq for TokenAsset {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.get_address()
    }
}

impl Eq for TokenAsset {}

impl Ord for TokenAsset {
    fn cmp(&self, other: &Self) -> Ordering {
        self.address.cmp(&other.get_address())
    }
}

impl PartialOrd for TokenAsset {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for TokenAsset {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{:#}", self.symbol, self.address)
    }
}

impl TokenAsset {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> TokenAsset {
        TokenAsset { address, symbol: symbol.into(), decimals }
    }

    /// Asset not present in the registry. Symbol falls back to the address.
    pub fn unknown(address: Address) -> TokenAsset {
        TokenAsset { address, symbol: address.to_string(), decimals: 18 }
    }

    // For testing purposes
    pub fn repeat_byte(byte: u8) -> TokenAsset {
        TokenAsset::new(Address::repeat_byte(byte), format!("T{byte:02x}"), 18)
    }

    pub fn get_address(&self) -> Address {
        self.address
    }

    pub fn get_symbol(&self) -> &str {
        &self.symbol
    }

    pub fn get_decimals(&self) -> u8 {
        self.decimals
    }

    pub fn get_exp(&self) -> U256 {
        if self.decimals == 18 { Unit::ETHER.wei() } else { U256::from(10).pow(U256::from(self.decimals)) }
    }

    /// Exact conversion of a human readable amount ("12.5") into the smallest unit.
    pub fn parse_units(&self, value: &str) -> Result<U256, UnitsError> {
        let value = value.trim();
        if value.starts_with('-') {
            return Err(UnitsError::InvalidUnit(value.to_string()));
        }
        Ok(parse_units(value, self.decimals)?.get_absolute())
    }

    pub fn format_units(&self, value: U256) -> Result<String, UnitsError> {
        format_units(value, self.decimals)
    }

    /// Lossy, for display only. Never feed the result back into amount math.
    pub fn to_float(&self, value: U256) -> f64 {
        let (div, rem) = value.div_rem(self.get_exp());
        match (u64::try_from(div), u64::try_from(rem)) {
            (Ok(div), Ok(rem)) => div as f64 + (rem as f64 / 10f64.powi(self.decimals as i32)),
            _ => f64::MAX,
        }
    }
}
