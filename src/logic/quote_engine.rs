use super::path_resolver::PathResolver;
use super::types::{ExchangePair, LegQuote, Quote, TradablePath, min_amount_out};
use crate::chain::Connection;
use crate::chain::contracts::IBroker;
use crate::errors::SwapError;
use crate::utils::TokenAssetWrapper;
use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, SolValue};
use futures::future::join_all;
use tracing::{debug, info};

/// Prices paths through the broker's `getAmountOut`. Read-only.
pub struct QuoteEngine<'a> {
    connection: &'a Connection,
    broker: Address,
}

impl<'a> QuoteEngine<'a> {
    pub fn new(connection: &'a Connection, broker: Address) -> Self {
        Self { connection, broker }
    }

    pub async fn get_amount_out(
        &self,
        exchange: &ExchangePair,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256, SwapError> {
        let call = IBroker::getAmountOutCall {
            exchangeProvider: exchange.provider_address,
            exchangeId: exchange.id,
            tokenIn: token_in,
            tokenOut: token_out,
            amountIn: amount_in,
        };
        let data = self
            .connection
            .call_contract(self.broker, call.abi_encode())
            .await
            .map_err(|e| SwapError::Quote(format!("getAmountOut on {exchange} failed: {e}")))?;
        let amount_out = U256::abi_decode(&data).map_err(|e| SwapError::Quote(format!("malformed getAmountOut result: {e}")))?;

        if amount_out.is_zero() {
            return Err(SwapError::Quote(format!("{exchange} quotes zero output for {amount_in}")));
        }
        Ok(amount_out)
    }

    /// Quote every leg in order, feeding each output into the next leg. No partial quotes.
    pub async fn quote(&self, path: &TradablePath, amount_in: U256, slippage_bps: u32) -> Result<Quote, SwapError> {
        let mut legs = Vec::with_capacity(path.len());
        let mut leg_amount_in = amount_in;

        for leg in path.legs() {
            let amount_out =
                self.get_amount_out(&leg.exchange, leg.token_in.get_address(), leg.token_out.get_address(), leg_amount_in).await?;
            debug!("Leg {} -> {}: {} -> {}", leg.token_in, leg.token_out, leg_amount_in, amount_out);

            legs.push(LegQuote {
                exchange: leg.exchange.clone(),
                token_in: leg.token_in.get_address(),
                token_out: leg.token_out.get_address(),
                amount_in: leg_amount_in,
                amount_out,
                min_amount_out: min_amount_out(amount_out, slippage_bps),
            });
            leg_amount_in = amount_out;
        }

        let amount_out = leg_amount_in;
        let quote = Quote {
            path: path.clone(),
            amount_in,
            amount_out,
            slippage_bps,
            min_amount_out: min_amount_out(amount_out, slippage_bps),
            legs,
        };
        info!("Quoted {} {} -> {} {} (min {})", amount_in, path.from_asset(), amount_out, path.to_asset(), quote.min_amount_out);
        Ok(quote)
    }

    /// Indicative output of `amount_in` of `from` in each target, quoted concurrently.
    /// Display only: never used to build a transaction.
    pub async fn quote_many(
        &self,
        exchanges: &[ExchangePair],
        from: &TokenAssetWrapper,
        targets: &[TokenAssetWrapper],
        amount_in: U256,
    ) -> Vec<(TokenAssetWrapper, Result<U256, SwapError>)> {
        let resolver = PathResolver::new(exchanges);
        let lookups = targets.iter().map(|target| {
            let path = resolver.find_path(from, target);
            async move {
                let amount_out = match path {
                    Ok(path) => self.quote(&path, amount_in, 0).await.map(|quote| quote.amount_out),
                    Err(e) => Err(e),
                };
                (target.clone(), amount_out)
            }
        });
        join_all(lookups).await
    }
}
