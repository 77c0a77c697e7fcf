use super::connection::Connection;
use super::contracts::{IBroker, IExchangeProvider};
use crate::errors::SwapError;
use crate::logic::types::ExchangePair;
use crate::utils::TokenRegistry;
use alloy_primitives::Address;
use alloy_sol_types::{SolCall, SolValue};
use tracing::{debug, info, warn};

/// Validate one raw venue at the protocol boundary
fn parse_exchange(
    provider: Address,
    raw: &IExchangeProvider::Exchange,
    registry: &TokenRegistry,
) -> Result<ExchangePair, String> {
    match raw.assets.as_slice() {
        [a, b] if a != b && !a.is_zero() && !b.is_zero() => {
            Ok(ExchangePair::new(raw.exchangeId, provider, [registry.resolve(*a), registry.resolve(*b)]))
        }
        [_, _] => Err("degenerate asset pair".to_string()),
        assets => Err(format!("expected 2 assets, got {}", assets.len())),
    }
}

/// Snapshot of every venue registered with the broker, in provider order.
/// Fetched live for each swap request; empty is an error.
pub async fn list_exchanges(
    connection: &Connection,
    broker: Address,
    registry: &TokenRegistry,
) -> Result<Vec<ExchangePair>, SwapError> {
    let data = connection
        .call_contract(broker, IBroker::getExchangeProvidersCall {}.abi_encode())
        .await
        .map_err(|e| SwapError::ExchangeDirectory(format!("getExchangeProviders failed: {e}")))?;
    let providers = Vec::<Address>::abi_decode(&data)
        .map_err(|e| SwapError::ExchangeDirectory(format!("malformed provider list: {e}")))?;

    debug!("Broker {} has {} exchange providers", broker, providers.len());

    let mut exchanges = Vec::new();
    for provider in providers {
        let data = connection
            .call_contract(provider, IExchangeProvider::getExchangesCall {}.abi_encode())
            .await
            .map_err(|e| SwapError::ExchangeDirectory(format!("getExchanges on {provider} failed: {e}")))?;
        let raw_exchanges = Vec::<IExchangeProvider::Exchange>::abi_decode(&data)
            .map_err(|e| SwapError::ExchangeDirectory(format!("malformed exchange list from {provider}: {e}")))?;

        for raw in &raw_exchanges {
            match parse_exchange(provider, raw, registry) {
                Ok(exchange) => exchanges.push(exchange),
                Err(reason) => warn!("Skipping exchange {} from {}: {}", raw.exchangeId, provider, reason),
            }
        }
    }

    if exchanges.is_empty() {
        return Err(SwapError::NoExchanges);
    }

    info!("Exchange directory lists {} venues", exchanges.len());
    Ok(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::mock_chain::MockChain;
    use crate::utils::constants::CeloTokenAddress;
    use alloy_primitives::B256;

    #[tokio::test]
    async fn test_lists_every_provider_in_order() {
        let chain = MockChain::new(42220);
        let provider_a = Address::repeat_byte(0xa0);
        let provider_b = Address::repeat_byte(0xb0);
        chain.add_exchange(provider_a, B256::repeat_byte(1), vec![CeloTokenAddress::CUSD, CeloTokenAddress::USDC]);
        chain.add_exchange(provider_b, B256::repeat_byte(2), vec![CeloTokenAddress::CEUR, CeloTokenAddress::USDC]);
        chain.add_exchange(provider_a, B256::repeat_byte(3), vec![CeloTokenAddress::CREAL, CeloTokenAddress::USDC]);

        let exchanges = list_exchanges(&chain.connection(), chain.broker(), &TokenRegistry::celo_mainnet()).await.unwrap();

        let ids = exchanges.iter().map(|e| e.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![B256::repeat_byte(1), B256::repeat_byte(3), B256::repeat_byte(2)]);
        assert_eq!(exchanges[0].assets[0].get_symbol(), "cUSD");
        assert_eq!(exchanges[0].provider_address, provider_a);
    }

    #[tokio::test]
    async fn test_malformed_exchanges_are_skipped() {
        let chain = MockChain::new(42220);
        let provider = Address::repeat_byte(0xa0);
        chain.add_exchange(provider, B256::repeat_byte(1), vec![CeloTokenAddress::CUSD]);
        chain.add_exchange(provider, B256::repeat_byte(2), vec![CeloTokenAddress::CUSD, CeloTokenAddress::CUSD]);
        chain.add_exchange(provider, B256::repeat_byte(3), vec![CeloTokenAddress::CUSD, CeloTokenAddress::CEUR]);

        let exchanges = list_exchanges(&chain.connection(), chain.broker(), &TokenRegistry::celo_mainnet()).await.unwrap();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(exchanges[0].id, B256::repeat_byte(3));
    }

    #[tokio::test]
    async fn test_empty_directory_is_fatal() {
        let chain = MockChain::new(42220);
        let err = list_exchanges(&chain.connection(), chain.broker(), &TokenRegistry::celo_mainnet()).await.unwrap_err();
        assert!(matches!(err, SwapError::NoExchanges));
    }

    #[tokio::test]
    async fn test_broker_call_failure_is_fatal() {
        let chain = MockChain::new(42220);
        chain.add_exchange(Address::repeat_byte(0xa0), B256::repeat_byte(1), vec![CeloTokenAddress::CUSD, CeloTokenAddress::CEUR]);

        let wrong_broker = Address::repeat_byte(0x99);
        let err = list_exchanges(&chain.connection(), wrong_broker, &TokenRegistry::celo_mainnet()).await.unwrap_err();
        assert!(matches!(err, SwapError::ExchangeDirectory(_)));
    }
}
