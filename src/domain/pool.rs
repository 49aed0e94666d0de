//! Per-pool accumulated ledger entity.

use super::decimal::Decimal;
use super::primitives::{address_key, Address, PoolVersion, U256};
use super::revenue::Revenue;
use thiserror::Error;

/// A revenue total would exceed the decimal range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("revenue total {field} overflows for pool {pool}")]
pub struct RevenueOverflow {
    pub pool: String,
    pub field: &'static str,
}

/// Accumulated revenue and point-in-time gauges for one watched pool.
///
/// Revenue fields only ever grow through [`Pool::apply_revenue`]; supply and debt
/// are gauges overwritten by each snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pool {
    /// Lowercase hex contract address.
    pub id: String,
    pub version: PoolVersion,

    pub total_supply: U256,
    pub total_supply_usd: Decimal,
    pub total_debt: U256,
    pub total_debt_usd: Decimal,

    pub protocol_revenue: Decimal,
    pub protocol_revenue_usd: Decimal,
    pub supply_side_revenue: Decimal,
    pub supply_side_revenue_usd: Decimal,
    pub total_revenue: Decimal,
    pub total_revenue_usd: Decimal,
}

impl Pool {
    /// A zero-initialised pool for an address seen for the first time.
    pub fn new(address: &Address, version: PoolVersion) -> Self {
        Self {
            id: address_key(address),
            version,
            total_supply: U256::ZERO,
            total_supply_usd: Decimal::zero(),
            total_debt: U256::ZERO,
            total_debt_usd: Decimal::zero(),
            protocol_revenue: Decimal::zero(),
            protocol_revenue_usd: Decimal::zero(),
            supply_side_revenue: Decimal::zero(),
            supply_side_revenue_usd: Decimal::zero(),
            total_revenue: Decimal::zero(),
            total_revenue_usd: Decimal::zero(),
        }
    }

    /// Add one event's revenue to the running totals.
    ///
    /// The two total fields receive the same deltas as the component fields, so
    /// `total_revenue == protocol_revenue + supply_side_revenue` holds as long as this
    /// is the only mutator of the revenue fields. On overflow nothing is changed.
    pub fn apply_revenue(&mut self, revenue: &Revenue) -> Result<(), RevenueOverflow> {
        let overflow = |field| RevenueOverflow {
            pool: self.id.clone(),
            field,
        };
        let add = |total: Decimal, delta: Option<Decimal>, field| {
            delta
                .and_then(|delta| total.checked_add(delta))
                .ok_or_else(|| overflow(field))
        };

        let protocol_revenue = add(
            self.protocol_revenue,
            Some(revenue.protocol_revenue),
            "protocol_revenue",
        )?;
        let protocol_revenue_usd = add(
            self.protocol_revenue_usd,
            Some(revenue.protocol_revenue_usd),
            "protocol_revenue_usd",
        )?;
        let supply_side_revenue = add(
            self.supply_side_revenue,
            Some(revenue.supply_side_revenue),
            "supply_side_revenue",
        )?;
        let supply_side_revenue_usd = add(
            self.supply_side_revenue_usd,
            Some(revenue.supply_side_revenue_usd),
            "supply_side_revenue_usd",
        )?;
        let total_revenue = add(self.total_revenue, revenue.total(), "total_revenue")?;
        let total_revenue_usd = add(self.total_revenue_usd, revenue.total_usd(), "total_revenue_usd")?;

        self.protocol_revenue = protocol_revenue;
        self.protocol_revenue_usd = protocol_revenue_usd;
        self.supply_side_revenue = supply_side_revenue;
        self.supply_side_revenue_usd = supply_side_revenue_usd;
        self.total_revenue = total_revenue;
        self.total_revenue_usd = total_revenue_usd;
        Ok(())
    }

    pub fn apply_supply_snapshot(&mut self, raw_supply: U256, supply_usd: Decimal) {
        self.total_supply = raw_supply;
        self.total_supply_usd = supply_usd;
    }

    pub fn apply_debt_snapshot(&mut self, raw_debt: U256, debt_usd: Decimal) {
        self.total_debt = raw_debt;
        self.total_debt_usd = debt_usd;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn revenue(protocol: &str, supply: &str) -> Revenue {
        Revenue {
            protocol_revenue: d(protocol),
            protocol_revenue_usd: d(protocol).checked_mul(d("2")).unwrap(),
            supply_side_revenue: d(supply),
            supply_side_revenue_usd: d(supply).checked_mul(d("2")).unwrap(),
        }
    }

    fn test_pool() -> Pool {
        Pool::new(
            &address!("bA4cFE5741b357FA371b506e5db0774aBFeCf8Fc"),
            PoolVersion::V2,
        )
    }

    #[test]
    fn test_new_pool_is_zeroed_and_keyed_lowercase() {
        let pool = test_pool();
        assert_eq!(pool.id, "0xba4cfe5741b357fa371b506e5db0774abfecf8fc");
        assert_eq!(pool.total_supply, U256::ZERO);
        assert!(pool.total_revenue.is_zero());
        assert!(pool.total_debt_usd.is_zero());
    }

    #[test]
    fn test_apply_revenue_accumulates_deltas_only() {
        let mut pool = test_pool();
        let revenues = [
            revenue("4.845", "0.255"),
            revenue("104.5", "5.5"),
            revenue("0.95", "0.05"),
        ];
        for r in &revenues {
            pool.apply_revenue(r).unwrap();
        }

        assert_eq!(pool.total_revenue, d("116.1"));
        assert_eq!(
            Some(pool.total_revenue),
            pool.protocol_revenue.checked_add(pool.supply_side_revenue)
        );
        assert_eq!(
            Some(pool.total_revenue_usd),
            pool.protocol_revenue_usd
                .checked_add(pool.supply_side_revenue_usd)
        );
        assert_eq!(pool.total_revenue_usd, d("232.2"));
    }

    #[test]
    fn test_snapshots_overwrite_and_are_idempotent() {
        let mut pool = test_pool();
        pool.apply_supply_snapshot(U256::from(500u64), d("10"));
        pool.apply_supply_snapshot(U256::from(700u64), d("14"));
        pool.apply_supply_snapshot(U256::from(700u64), d("14"));
        assert_eq!(pool.total_supply, U256::from(700u64));
        assert_eq!(pool.total_supply_usd, d("14"));

        pool.apply_debt_snapshot(U256::from(300u64), d("6"));
        let after_first = pool.clone();
        pool.apply_debt_snapshot(U256::from(300u64), d("6"));
        assert_eq!(pool, after_first);
    }

    #[test]
    fn test_snapshots_leave_revenue_untouched() {
        let mut pool = test_pool();
        pool.apply_revenue(&revenue("1", "0")).unwrap();
        pool.apply_supply_snapshot(U256::from(1u64), d("1"));
        pool.apply_debt_snapshot(U256::from(1u64), d("1"));
        assert_eq!(pool.protocol_revenue, d("1"));
        assert_eq!(pool.total_revenue, d("1"));
    }

    #[test]
    fn test_overflowing_revenue_leaves_pool_unchanged() {
        let mut pool = test_pool();
        let large = revenue("30000000000000000000000000000", "0");
        pool.apply_revenue(&large).unwrap();
        let before = pool.clone();

        // token total still fits, the doubled USD total does not
        let err = pool.apply_revenue(&large).unwrap_err();
        assert_eq!(err.field, "protocol_revenue_usd");
        assert_eq!(pool, before);
    }
}
