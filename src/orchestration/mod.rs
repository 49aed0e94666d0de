//! Event handlers and the dispatcher that drives them.
//!
//! Handlers are stateless: everything they know comes from the chain reader pinned
//! to the event's block and from the pool ledger. Unavailable reads never surface as
//! errors; only persistence failures do.

pub mod block;
pub mod indexer;
pub mod interest;
pub mod withdraw;

pub use indexer::{Indexer, IndexerError};

use crate::config::ContractsConfig;
use crate::datasource::ChainReader;
use crate::db::ProcessedEvent;
use crate::domain::{Address, PoolVersion, Revenue};
use crate::engine::{
    pool_adapter, PoolAdapter, PoolLedger, PriceOracle, RevenueCalculator, RevenueWrite,
};
use std::sync::Arc;

/// What a handler did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// The ledger was updated.
    Applied,
    /// The event does not describe a fee for this pool.
    NotApplicable(&'static str),
    /// A required read was unavailable; nothing was written.
    Dropped(&'static str),
    /// Already applied under the same (tx hash, log index).
    Duplicate,
}

/// Collaborators for handling a single event, all reading at the same block.
pub struct HandlerContext<'a> {
    pub reader: Arc<dyn ChainReader>,
    pub contracts: &'a ContractsConfig,
    pub ledger: &'a PoolLedger,
    pub oracle: PriceOracle,
    pub calculator: RevenueCalculator,
    /// Set when deduplication is on; recorded together with the revenue write.
    pub processed_event: Option<ProcessedEvent>,
}

impl<'a> HandlerContext<'a> {
    pub fn new(
        reader: Arc<dyn ChainReader>,
        contracts: &'a ContractsConfig,
        ledger: &'a PoolLedger,
        processed_event: Option<ProcessedEvent>,
    ) -> Self {
        let oracle = PriceOracle::new(reader.clone(), contracts);
        Self {
            reader,
            contracts,
            ledger,
            calculator: RevenueCalculator::new(oracle.clone()),
            oracle,
            processed_event,
        }
    }

    pub fn adapter(&self, pool: Address, version: PoolVersion) -> Box<dyn PoolAdapter> {
        pool_adapter(pool, version, self.reader.clone(), self.contracts)
    }

    /// Accumulate one event's revenue into its pool.
    async fn record_revenue(
        &self,
        pool_address: Address,
        version: PoolVersion,
        revenue: &Revenue,
    ) -> Result<HandleOutcome, sqlx::Error> {
        let mut pool = self.ledger.load_or_create(&pool_address, version).await?;
        let write = self
            .ledger
            .apply_revenue(&mut pool, revenue, self.processed_event.as_ref())
            .await?;
        Ok(match write {
            RevenueWrite::Applied => HandleOutcome::Applied,
            RevenueWrite::AlreadyApplied => HandleOutcome::Duplicate,
            RevenueWrite::Overflow => HandleOutcome::Dropped("revenue totals overflow"),
        })
    }
}
