//! Fee split into protocol and supply-side revenue.

use super::oracle::PriceOracle;
use crate::domain::{Decimal, Revenue, Token};
use rust_decimal::Decimal as RustDecimal;
use thiserror::Error;

/// Share of every fee retained by the protocol.
pub const PROTOCOL_SHARE: Decimal = Decimal::new(RustDecimal::from_parts(95, 0, 0, false, 2));
/// Share of every fee attributed to suppliers.
pub const SUPPLY_SIDE_SHARE: Decimal = Decimal::new(RustDecimal::from_parts(5, 0, 0, false, 2));

/// Split a fee into (protocol, supply-side) underlying-token amounts.
///
/// `conversion_rate` turns share-denominated fees into underlying units; pass one
/// when the fee is already in underlying units. `None` when a part overflows.
pub fn split_fee(interest: Decimal, conversion_rate: Decimal) -> Option<(Decimal, Decimal)> {
    let protocol = interest
        .checked_mul(PROTOCOL_SHARE)?
        .checked_mul(conversion_rate)?;
    let supply_side = interest
        .checked_mul(SUPPLY_SIDE_SHARE)?
        .checked_mul(conversion_rate)?;
    Some((protocol, supply_side))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevenueError {
    #[error("fee {fee} at conversion rate {rate} overflows")]
    Overflow { fee: Decimal, rate: Decimal },
}

#[derive(Debug, Clone)]
pub struct RevenueCalculator {
    oracle: PriceOracle,
}

impl RevenueCalculator {
    pub fn new(oracle: PriceOracle) -> Self {
        Self { oracle }
    }

    /// Split `interest` 95/5, convert with `conversion_rate` and price both parts in USD.
    pub async fn compute_revenue(
        &self,
        interest: Decimal,
        conversion_rate: Decimal,
        token: &Token,
    ) -> Result<Revenue, RevenueError> {
        let (protocol_revenue, supply_side_revenue) =
            split_fee(interest, conversion_rate).ok_or(RevenueError::Overflow {
                fee: interest,
                rate: conversion_rate,
            })?;
        let protocol_revenue_usd = self.oracle.quote_usd(protocol_revenue, token).await;
        let supply_side_revenue_usd = self.oracle.quote_usd(supply_side_revenue, token).await;

        Ok(Revenue {
            protocol_revenue,
            protocol_revenue_usd,
            supply_side_revenue,
            supply_side_revenue_usd,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContractsConfig;
    use crate::datasource::MockChainReader;
    use crate::domain::{Address, U256};
    use alloy_primitives::address;
    use std::sync::Arc;

    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_shares_sum_to_one() {
        assert_eq!(PROTOCOL_SHARE.checked_add(SUPPLY_SIDE_SHARE), Some(Decimal::one()));
        assert_eq!(PROTOCOL_SHARE, d("0.95"));
    }

    #[test]
    fn test_split_fee_on_withdraw() {
        let (protocol, supply) = split_fee(d("5"), d("1.02")).unwrap();
        assert_eq!(protocol, d("4.845"));
        assert_eq!(supply, d("0.255"));
    }

    #[test]
    fn test_split_fee_preserves_total_and_ratio() {
        let cases = [("110", "1"), ("100", "1.1"), ("0.000123", "1.0375"), ("987654.321", "0.5")];
        for (interest, rate) in cases {
            let (protocol, supply) = split_fee(d(interest), d(rate)).unwrap();
            assert_eq!(
                protocol.checked_add(supply),
                d(interest).checked_mul(d(rate)),
                "sum for {}",
                interest
            );
            assert_eq!(
                supply.checked_mul(d("19")),
                Some(protocol),
                "ratio for {}",
                interest
            );
        }
    }

    #[test]
    fn test_split_zero_fee() {
        let (protocol, supply) = split_fee(Decimal::zero(), d("1.2")).unwrap();
        assert!(protocol.is_zero());
        assert!(supply.is_zero());
    }

    #[test]
    fn test_compute_revenue_prices_both_parts() {
        let mock = MockChainReader::new().with_usd_quote(DAI, U256::from(2_000_000u64));
        let oracle = PriceOracle::new(Arc::new(mock), &ContractsConfig::default());
        let calculator = RevenueCalculator::new(oracle);

        let revenue = tokio_test::block_on(calculator.compute_revenue(
            d("100"),
            d("1.1"),
            &Token::new(DAI, 18),
        ))
        .unwrap();
        assert_eq!(revenue.protocol_revenue, d("104.5"));
        assert_eq!(revenue.supply_side_revenue, d("5.5"));
        assert_eq!(revenue.protocol_revenue_usd, d("209"));
        assert_eq!(revenue.supply_side_revenue_usd, d("11"));
        assert_eq!(revenue.total(), Some(d("110")));
        assert_eq!(revenue.total_usd(), Some(d("220")));
    }

    #[test]
    fn test_compute_revenue_overflow_is_an_error() {
        let mock = MockChainReader::new();
        let calculator =
            RevenueCalculator::new(PriceOracle::new(Arc::new(mock.clone()), &ContractsConfig::default()));

        let result = tokio_test::block_on(calculator.compute_revenue(
            d("1000000000000000000000000"),
            d("100000000"),
            &Token::new(DAI, 18),
        ));
        assert!(matches!(result, Err(RevenueError::Overflow { .. })));
        assert_eq!(mock.call_count(), 0);
    }
}
