//! USD pricing through a Uniswap V2 style router.

use crate::config::ContractsConfig;
use crate::datasource::{ChainReader, ReadError};
use crate::domain::{address_key, one_unit, to_decimal_amount, Address, Decimal, Token, UnitsError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum OracleError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Units(#[from] UnitsError),
    #[error("router returned no amounts")]
    EmptyQuote,
    #[error("{amount} at USD rate {rate} overflows")]
    Overflow { amount: Decimal, rate: Decimal },
}

/// Quotes token amounts in the USD-stable token.
///
/// The rate is queried on every call; nothing is cached between events.
#[derive(Debug, Clone)]
pub struct PriceOracle {
    reader: Arc<dyn ChainReader>,
    router: Address,
    usd_token: Token,
    routing_hop: Address,
}

impl PriceOracle {
    pub fn new(reader: Arc<dyn ChainReader>, contracts: &ContractsConfig) -> Self {
        Self {
            reader,
            router: contracts.price_router,
            usd_token: Token::new(contracts.usd_token, contracts.usd_token_decimals),
            routing_hop: contracts.routing_hop,
        }
    }

    /// Value `amount` of `token` in USD.
    ///
    /// Falls back to a rate of 1 when the router call fails or the priced amount
    /// overflows, so a missing price point never stops accumulation.
    pub async fn quote_usd(&self, amount: Decimal, token: &Token) -> Decimal {
        if token.address == self.usd_token.address {
            return amount;
        }

        let priced = self.usd_rate(token).await.and_then(|rate| {
            debug!(
                token = %address_key(&token.address),
                rate = %rate,
                "USD rate resolved"
            );
            amount
                .checked_mul(rate)
                .ok_or(OracleError::Overflow { amount, rate })
        });
        match priced {
            Ok(usd) => usd,
            Err(e) => {
                warn!(
                    token = %address_key(&token.address),
                    decimals = token.decimals,
                    error = %e,
                    "USD rate unavailable, falling back to 1"
                );
                amount
            }
        }
    }

    /// Path from `token` to the USD token, via the routing hop unless the token is the hop.
    pub fn route(&self, token: &Address) -> Vec<Address> {
        let mut path = vec![*token];
        if *token != self.routing_hop {
            path.push(self.routing_hop);
        }
        path.push(self.usd_token.address);
        path
    }

    /// USD value of one whole unit of `token`.
    pub async fn usd_rate(&self, token: &Token) -> Result<Decimal, OracleError> {
        let amounts = self
            .reader
            .amounts_out(self.router, one_unit(token.decimals), self.route(&token.address))
            .await?;
        let raw_out = amounts.last().copied().ok_or(OracleError::EmptyQuote)?;
        Ok(to_decimal_amount(raw_out, self.usd_token.decimals)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockChainReader;
    use crate::domain::U256;
    use alloy_primitives::address;

    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn oracle(mock: &MockChainReader) -> (PriceOracle, ContractsConfig) {
        let contracts = ContractsConfig::default();
        (PriceOracle::new(Arc::new(mock.clone()), &contracts), contracts)
    }

    #[tokio::test]
    async fn test_usd_token_is_identity_without_calls() {
        let mock = MockChainReader::new();
        let (oracle, contracts) = oracle(&mock);
        let usdc = Token::new(contracts.usd_token, 6);
        assert_eq!(oracle.quote_usd(d("12.5"), &usdc).await, d("12.5"));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_quote_routes_through_hop() {
        let mock = MockChainReader::new().with_usd_quote(DAI, U256::from(1_010_000u64));
        let (oracle, contracts) = oracle(&mock);
        let usd = oracle.quote_usd(d("100"), &Token::new(DAI, 18)).await;
        assert_eq!(usd, d("101"));
        assert_eq!(
            mock.quote_paths(),
            vec![vec![DAI, contracts.routing_hop, contracts.usd_token]]
        );
    }

    #[tokio::test]
    async fn test_hop_token_routes_directly() {
        let contracts = ContractsConfig::default();
        let mock = MockChainReader::new().with_usd_quote(contracts.routing_hop, U256::from(2_500_000_000u64));
        let oracle = PriceOracle::new(Arc::new(mock.clone()), &contracts);
        let weth = Token::new(contracts.routing_hop, 18);
        assert_eq!(oracle.quote_usd(d("2"), &weth).await, d("5000"));
        assert_eq!(
            mock.quote_paths(),
            vec![vec![contracts.routing_hop, contracts.usd_token]]
        );
    }

    #[tokio::test]
    async fn test_router_revert_falls_back_to_identity() {
        let mock = MockChainReader::new();
        let (oracle, _) = oracle(&mock);
        let usd = oracle.quote_usd(d("7.25"), &Token::new(DAI, 18)).await;
        assert_eq!(usd, d("7.25"));
    }

    #[tokio::test]
    async fn test_rate_is_requeried_every_call() {
        let mock = MockChainReader::new().with_usd_quote(DAI, U256::from(1_000_000u64));
        let (oracle, _) = oracle(&mock);
        let dai = Token::new(DAI, 18);
        oracle.quote_usd(d("1"), &dai).await;
        oracle.quote_usd(d("1"), &dai).await;
        assert_eq!(mock.quote_paths().len(), 2);
    }

    #[tokio::test]
    async fn test_overflowing_usd_value_falls_back_to_identity() {
        // 1e23 USD per token, quoted in 6-decimal USD units
        let mock = MockChainReader::new().with_usd_quote(DAI, one_unit(29));
        let (oracle, _) = oracle(&mock);
        let dai = Token::new(DAI, 18);

        assert_eq!(oracle.quote_usd(d("2"), &dai).await, d("200000000000000000000000"));
        assert_eq!(oracle.quote_usd(d("1000000000"), &dai).await, d("1000000000"));
    }
}
