use alloy_primitives::{Address, address};

pub const CELO_MAINNET_CHAIN_ID: u64 = 42220;

/// Mento broker on Celo mainnet. Spender for every swap approval.
pub const MENTO_BROKER: Address = address!("0x777A8255cA72412f0d706dc03C9D1987306B4CaD");

pub const FORNO_RPC_URL: &str = "https://forno.celo.org";
pub const FALLBACK_RPC_URLS: [&str; 2] = ["https://rpc.ankr.com/celo", "https://1rpc.io/celo"];

#[non_exhaustive]
pub struct CeloTokenAddress;

impl CeloTokenAddress {
    pub const CELO: Address = address!("0x471EcE3750Da237f93B8E339c536989b8978a438");

    // Mento stables
    pub const CUSD: Address = address!("0x765DE816845861e75A25fCA122bb6898B8B1282a");
    pub const CEUR: Address = address!("0xD8763CBa276a3738E6DE85b4b3bF5FDed6D6cA73");
    pub const CREAL: Address = address!("0xe8537a3d056DA446677B9E9d6c5dB704EaAb4787");
    pub const EXOF: Address = address!("0x73F93dcc49cB8A239e2032663e9475dd5ef29A08");
    pub const CKES: Address = address!("0x456a3D042C0DbD3db53D5489e98dFb038553B0d0");

    // Bridged collateral
    pub const USDC: Address = address!("0xcebA9300f2b948710d2653dD7B07f33A8B32118C");
    pub const USDT: Address = address!("0x48065fbBE25f71C9282ddf5e1cD6D6A887483D5e");
}
