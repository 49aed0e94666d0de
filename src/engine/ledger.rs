//! Pool entity accumulation backed by the repository.

use crate::db::{ProcessedEvent, Repository};
use crate::domain::{address_key, Address, Decimal, Pool, PoolVersion, Revenue, U256};
use std::sync::Arc;
use tracing::{debug, warn};

/// What [`PoolLedger::apply_revenue`] did with one event's revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevenueWrite {
    Applied,
    /// The event marker was already present; nothing was written.
    AlreadyApplied,
    /// A running total would overflow; nothing was written.
    Overflow,
}

/// Loads pools and persists every mutation before returning.
///
/// Persistence errors propagate; the caller treats them as fatal for the event.
#[derive(Clone)]
pub struct PoolLedger {
    repo: Arc<Repository>,
}

impl PoolLedger {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Existing pool, or a zeroed one tagged with `version`. Never absent.
    pub async fn load_or_create(
        &self,
        address: &Address,
        version: PoolVersion,
    ) -> Result<Pool, sqlx::Error> {
        match self.repo.load_pool(&address_key(address)).await? {
            Some(pool) => Ok(pool),
            None => {
                debug!(pool = %address_key(address), version = %version, "creating pool entity");
                Ok(Pool::new(address, version))
            }
        }
    }

    /// Accumulate `revenue` and persist the pool.
    ///
    /// With `event`, the pool row and the event marker are committed together.
    /// `pool` is only updated when the write happened.
    pub async fn apply_revenue(
        &self,
        pool: &mut Pool,
        revenue: &Revenue,
        event: Option<&ProcessedEvent>,
    ) -> Result<RevenueWrite, sqlx::Error> {
        let mut updated = pool.clone();
        if let Err(e) = updated.apply_revenue(revenue) {
            warn!(pool = %pool.id, error = %e, "revenue not applied");
            return Ok(RevenueWrite::Overflow);
        }

        match event {
            Some(event) => {
                if !self.repo.upsert_pool_with_event(&updated, event).await? {
                    debug!(pool = %pool.id, event = %event.key, "event already recorded");
                    return Ok(RevenueWrite::AlreadyApplied);
                }
            }
            None => self.repo.upsert_pool(&updated).await?,
        }

        *pool = updated;
        Ok(RevenueWrite::Applied)
    }

    pub async fn apply_supply_snapshot(
        &self,
        pool: &mut Pool,
        raw_supply: U256,
        supply_usd: Decimal,
    ) -> Result<(), sqlx::Error> {
        pool.apply_supply_snapshot(raw_supply, supply_usd);
        self.repo.upsert_pool(pool).await
    }

    pub async fn apply_debt_snapshot(
        &self,
        pool: &mut Pool,
        raw_debt: U256,
        debt_usd: Decimal,
    ) -> Result<(), sqlx::Error> {
        pool.apply_debt_snapshot(raw_debt, debt_usd);
        self.repo.upsert_pool(pool).await
    }

    /// Persist the pool as-is, used when a tick produced no gauge update for a new pool.
    pub async fn save(&self, pool: &Pool) -> Result<(), sqlx::Error> {
        self.repo.upsert_pool(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use alloy_primitives::address;
    use tempfile::TempDir;

    const POOL: Address = address!("2222222222222222222222222222222222222222");

    async fn setup_ledger() -> (PoolLedger, Arc<Repository>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        let repo = Arc::new(Repository::new(pool));
        (PoolLedger::new(repo.clone()), repo, temp_dir)
    }

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn revenue(protocol: &str, supply_side: &str) -> Revenue {
        Revenue {
            protocol_revenue: d(protocol),
            protocol_revenue_usd: d(protocol),
            supply_side_revenue: d(supply_side),
            supply_side_revenue_usd: d(supply_side),
        }
    }

    #[tokio::test]
    async fn test_load_or_create_returns_zeroed_pool_without_persisting() {
        let (ledger, repo, _temp) = setup_ledger().await;
        let pool = ledger.load_or_create(&POOL, PoolVersion::V3).await.unwrap();
        assert_eq!(pool, Pool::new(&POOL, PoolVersion::V3));
        assert!(repo.load_pool(&pool.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_revenue_accumulates_across_loads() {
        let (ledger, _repo, _temp) = setup_ledger().await;

        for (protocol, supply_side) in [("4.845", "0.255"), ("104.5", "5.5")] {
            let mut pool = ledger.load_or_create(&POOL, PoolVersion::V2).await.unwrap();
            let write = ledger
                .apply_revenue(&mut pool, &revenue(protocol, supply_side), None)
                .await
                .unwrap();
            assert_eq!(write, RevenueWrite::Applied);
        }

        let pool = ledger.load_or_create(&POOL, PoolVersion::V2).await.unwrap();
        assert_eq!(pool.protocol_revenue, d("109.345"));
        assert_eq!(pool.supply_side_revenue, d("5.755"));
        assert_eq!(pool.total_revenue, d("115.1"));
        assert_eq!(pool.total_revenue_usd, d("115.1"));
    }

    #[tokio::test]
    async fn test_snapshots_overwrite_persisted_gauges() {
        let (ledger, _repo, _temp) = setup_ledger().await;
        let mut pool = ledger.load_or_create(&POOL, PoolVersion::V3).await.unwrap();
        ledger
            .apply_supply_snapshot(&mut pool, U256::from(10u64), d("10"))
            .await
            .unwrap();
        ledger
            .apply_supply_snapshot(&mut pool, U256::from(7u64), d("7.7"))
            .await
            .unwrap();
        ledger
            .apply_debt_snapshot(&mut pool, U256::from(3u64), d("3"))
            .await
            .unwrap();

        let pool = ledger.load_or_create(&POOL, PoolVersion::V3).await.unwrap();
        assert_eq!(pool.total_supply, U256::from(7u64));
        assert_eq!(pool.total_supply_usd, d("7.7"));
        assert_eq!(pool.total_debt_usd, d("3"));
        assert!(pool.total_revenue.is_zero());
    }

    #[tokio::test]
    async fn test_revenue_with_recorded_event_is_not_applied() {
        let (ledger, repo, _temp) = setup_ledger().await;
        let event = ProcessedEvent {
            key: "0xab:1".to_string(),
            block_number: 7,
        };

        let mut pool = ledger.load_or_create(&POOL, PoolVersion::V2).await.unwrap();
        let first = ledger
            .apply_revenue(&mut pool, &revenue("0.95", "0.05"), Some(&event))
            .await
            .unwrap();
        let again = ledger
            .apply_revenue(&mut pool, &revenue("0.95", "0.05"), Some(&event))
            .await
            .unwrap();

        assert_eq!(first, RevenueWrite::Applied);
        assert_eq!(again, RevenueWrite::AlreadyApplied);
        assert_eq!(pool.total_revenue, d("1"));
        let stored = repo.load_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(stored.total_revenue, d("1"));
        assert!(repo.is_event_processed("0xab:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_overflowing_revenue_is_not_persisted() {
        let (ledger, repo, _temp) = setup_ledger().await;
        let mut pool = ledger.load_or_create(&POOL, PoolVersion::V2).await.unwrap();
        let large = revenue("50000000000000000000000000000", "0");

        ledger.apply_revenue(&mut pool, &large, None).await.unwrap();
        let write = ledger.apply_revenue(&mut pool, &large, None).await.unwrap();

        assert_eq!(write, RevenueWrite::Overflow);
        let stored = repo.load_pool(&pool.id).await.unwrap().unwrap();
        assert_eq!(stored.protocol_revenue, d("50000000000000000000000000000"));
    }
}
