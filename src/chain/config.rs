use crate::utils::constants::{CELO_MAINNET_CHAIN_ID, FALLBACK_RPC_URLS, FORNO_RPC_URL, MENTO_BROKER};
use crate::utils::config_loader::{LoadConfigError, load_from_file, load_from_file_sync};
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Configuration for one swap engine instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Endpoint tried first for every swap request
    pub primary_rpc_url: String,
    /// Tried in order when the primary endpoint is down or on the wrong chain
    pub fallback_rpc_urls: Vec<String>,
    /// Endpoints reporting another chain id are rejected. `None` accepts any non-zero id.
    pub expected_chain_id: Option<u64>,
    /// AMM broker: quote source, swap target and approval spender
    pub broker_address: Address,
    /// Timeout for a single HTTP request in seconds
    pub http_timeout_secs: u64,
    /// Delay between receipt polls in milliseconds
    pub receipt_poll_interval_ms: u64,
    /// A receipt not observed within this window leaves the transaction pending
    pub receipt_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            primary_rpc_url: FORNO_RPC_URL.to_string(),
            fallback_rpc_urls: FALLBACK_RPC_URLS.iter().map(|url| url.to_string()).collect(),
            expected_chain_id: Some(CELO_MAINNET_CHAIN_ID),
            broker_address: MENTO_BROKER,
            http_timeout_secs: 10,
            receipt_poll_interval_ms: 1_000,
            receipt_timeout_secs: 120,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> eyre::Result<Self> {
        let mut config = Self::default();

        if let Ok(rpc_url) = std::env::var("RPC_URL") {
            let _url = Url::parse(&rpc_url).map_err(|e| eyre::eyre!("Invalid RPC_URL: {}", e))?;
            config.primary_rpc_url = rpc_url;
        }

        if let Ok(fallbacks) = std::env::var("RPC_FALLBACK_URLS") {
            let mut urls = Vec::new();
            for url in fallbacks.split(',').map(str::trim).filter(|url| !url.is_empty()) {
                let _url = Url::parse(url).map_err(|e| eyre::eyre!("Invalid RPC_FALLBACK_URLS entry {}: {}", url, e))?;
                urls.push(url.to_string());
            }
            config.fallback_rpc_urls = urls;
        }

        if let Ok(chain_id_str) = std::env::var("CHAIN_ID") {
            config.expected_chain_id = Some(chain_id_str.parse().map_err(|e| eyre::eyre!("Invalid CHAIN_ID: {}", e))?);
        }

        if let Ok(broker_str) = std::env::var("BROKER_ADDRESS") {
            config.broker_address = broker_str.parse().map_err(|e| eyre::eyre!("Invalid BROKER_ADDRESS: {}", e))?;
        }

        if let Ok(timeout_str) = std::env::var("HTTP_TIMEOUT_SECS") {
            config.http_timeout_secs = timeout_str.parse().map_err(|e| eyre::eyre!("Invalid HTTP_TIMEOUT_SECS: {}", e))?;
        }

        if let Ok(interval_str) = std::env::var("RECEIPT_POLL_INTERVAL_MS") {
            config.receipt_poll_interval_ms =
                interval_str.parse().map_err(|e| eyre::eyre!("Invalid RECEIPT_POLL_INTERVAL_MS: {}", e))?;
        }

        if let Ok(timeout_str) = std::env::var("RECEIPT_TIMEOUT_SECS") {
            config.receipt_timeout_secs = timeout_str.parse().map_err(|e| eyre::eyre!("Invalid RECEIPT_TIMEOUT_SECS: {}", e))?;
        }

        Ok(config)
    }

    pub async fn from_file(file_name: String) -> Result<Self, LoadConfigError> {
        load_from_file(file_name).await
    }

    pub fn from_file_sync(file_name: String) -> Result<Self, LoadConfigError> {
        load_from_file_sync(file_name)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }

    pub fn receipt_timeout(&self) -> Duration {
        Duration::from_secs(self.receipt_timeout_secs)
    }
}
