//! Read-only access to the pool, strategy, registry and router contracts.

use crate::domain::{Address, PoolVersion, U256};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

pub mod bindings;
pub mod mock;
pub mod rpc;

pub use mock::MockChainReader;
pub use rpc::RpcChainReader;

/// Contract accessors consumed by the revenue engine.
///
/// Each method is a single view call. A revert is reported as
/// [`ReadError::Reverted`] and means "value unavailable for this event"; callers
/// decide whether that skips a field or the whole event.
#[async_trait]
pub trait ChainReader: Send + Sync + fmt::Debug {
    /// A reader whose calls are evaluated at `block_number`.
    fn at_block(&self, block_number: u64) -> Arc<dyn ChainReader>;

    /// `token()` of a pool: its underlying collateral token.
    async fn token(&self, pool: Address) -> Result<Address, ReadError>;

    /// ERC-20 `decimals()`, also exposed by pools for their share token.
    async fn decimals(&self, contract: Address) -> Result<u8, ReadError>;

    async fn total_supply(&self, pool: Address) -> Result<U256, ReadError>;

    /// `totalDebt()`, V3 pools only.
    async fn total_debt(&self, pool: Address) -> Result<U256, ReadError>;

    async fn withdraw_fee(&self, pool: Address) -> Result<U256, ReadError>;

    /// `feeWhiteList()` on V2, `feeWhitelist()` on V3.
    async fn fee_whitelist(&self, pool: Address, version: PoolVersion)
        -> Result<Address, ReadError>;

    /// `getPricePerShare()` on V2, `pricePerShare()` on V3.
    async fn price_per_share(&self, pool: Address, version: PoolVersion)
        -> Result<U256, ReadError>;

    /// `getStrategies()`, V3 pools only.
    async fn strategies(&self, pool: Address) -> Result<Vec<Address>, ReadError>;

    /// Controller `strategy(pool)` mapping, V2 pools only.
    async fn controller_strategy(
        &self,
        controller: Address,
        pool: Address,
    ) -> Result<Address, ReadError>;

    /// Strategy `totalLocked()`, V2 strategies only.
    async fn total_locked(&self, strategy: Address) -> Result<U256, ReadError>;

    /// Address-list registry `contains(account)`.
    async fn list_contains(&self, list: Address, account: Address) -> Result<bool, ReadError>;

    /// Router `getAmountsOut(amountIn, path)`.
    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ReadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadError {
    #[error("call {method} on {contract} reverted: {reason}")]
    Reverted {
        contract: Address,
        method: &'static str,
        reason: String,
    },
    #[error("transport error: {0}")]
    Transport(String),
    /// The node answered with an error that is not a revert.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("failed to decode {method} result: {message}")]
    Decode {
        method: &'static str,
        message: String,
    },
}

impl ReadError {
    pub fn reverted(contract: Address, method: &'static str) -> Self {
        ReadError::Reverted {
            contract,
            method,
            reason: "execution reverted".to_string(),
        }
    }

    pub fn is_revert(&self) -> bool {
        matches!(self, ReadError::Reverted { .. })
    }
}
