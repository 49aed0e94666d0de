//! V2 strategy resolution through the controller registry.

use crate::datasource::{ChainReader, ReadError};
use crate::domain::{Address, U256};
use std::sync::Arc;

/// Resolves the strategy currently attached to a V2 pool.
///
/// Resolution is fresh on every call since strategies can be migrated.
#[derive(Debug, Clone)]
pub struct StrategyResolver {
    reader: Arc<dyn ChainReader>,
    controller: Address,
}

impl StrategyResolver {
    pub fn new(reader: Arc<dyn ChainReader>, controller: Address) -> Self {
        Self { reader, controller }
    }

    pub async fn resolve_strategy_address(&self, pool: Address) -> Result<Address, ReadError> {
        self.reader.controller_strategy(self.controller, pool).await
    }

    pub async fn resolve_strategy(&self, pool: Address) -> Result<StrategyHandle, ReadError> {
        let address = self.resolve_strategy_address(pool).await?;
        Ok(StrategyHandle {
            address,
            reader: self.reader.clone(),
        })
    }
}

/// A bound V2 strategy contract.
#[derive(Debug, Clone)]
pub struct StrategyHandle {
    pub address: Address,
    reader: Arc<dyn ChainReader>,
}

impl StrategyHandle {
    /// Value locked in the strategy, used as the V2 pool's debt.
    pub async fn total_locked(&self) -> Result<U256, ReadError> {
        self.reader.total_locked(self.address).await
    }
}
