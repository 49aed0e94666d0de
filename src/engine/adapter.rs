//! Generation-specific pool reads behind a uniform interface.
//!
//! V2 and V3 pools expose the same concepts with different units: V2 quotes its
//! withdraw fee and price per share in 18-decimal fixed point, V3 quotes the fee in
//! basis points and the price per share in underlying-token decimals. Everything
//! returned from a [`PoolAdapter`] is already normalised, so the handlers never
//! branch on the pool version.

use super::resolver::StrategyResolver;
use crate::config::ContractsConfig;
use crate::datasource::{ChainReader, ReadError};
use crate::domain::{
    to_decimal_amount, Address, Decimal, PoolVersion, Token, UnitsError, U256,
};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// V2 fee and price-per-share precision.
pub const V2_FIXED_POINT_DECIMALS: u32 = 18;
/// V3 withdraw fee precision (basis points of 10_000).
pub const V3_FEE_DECIMALS: u32 = 4;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error(transparent)]
    Units(#[from] UnitsError),
}

/// Unit in which a pool pays interest fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeUnits {
    /// Fees arrive as underlying tokens (V2 strategy deposits).
    Underlying,
    /// Fees arrive as freshly minted shares (V3).
    Shares,
}

#[async_trait]
pub trait PoolAdapter: Send + Sync + fmt::Debug {
    fn address(&self) -> Address;

    fn version(&self) -> PoolVersion;

    fn interest_fee_units(&self) -> FeeUnits;

    /// The pool's collateral token and its decimals.
    async fn underlying_token(&self) -> Result<Token, ReadError>;

    /// Decimals of the pool's own share token.
    async fn share_decimals(&self) -> Result<u32, ReadError>;

    /// Raw share supply.
    async fn fetch_supply(&self) -> Result<U256, ReadError>;

    /// Raw debt in underlying units, `None` when the pool carries no debt.
    async fn fetch_debt_or_locked_value(&self) -> Result<Option<U256>, ReadError>;

    /// Withdraw fee as a fraction (0.005 for 0.5%).
    async fn fetch_withdraw_fee_rate(&self) -> Result<Decimal, AdapterError>;

    /// Underlying tokens per share.
    async fn fetch_conversion_rate(&self) -> Result<Decimal, AdapterError>;

    /// Fee whitelist registry, `None` when the pool has none configured.
    async fn fetch_whitelist(&self) -> Result<Option<WhitelistRegistry>, ReadError>;

    /// Addresses whose transfers into the pool are interest fees.
    async fn fetch_fee_sources(&self) -> Result<Vec<Address>, ReadError>;
}

/// Build the adapter matching a pool's generation.
pub fn pool_adapter(
    address: Address,
    version: PoolVersion,
    reader: Arc<dyn ChainReader>,
    contracts: &ContractsConfig,
) -> Box<dyn PoolAdapter> {
    match version {
        PoolVersion::V2 => Box::new(PoolV2Adapter {
            address,
            resolver: StrategyResolver::new(reader.clone(), contracts.controller),
            fee_exempt_pool: contracts.fee_exempt_pool,
            reader,
        }),
        PoolVersion::V3 => Box::new(PoolV3Adapter { address, reader }),
    }
}

/// Registry of addresses exempt from withdraw fees.
#[derive(Debug, Clone)]
pub struct WhitelistRegistry {
    pub address: Address,
    reader: Arc<dyn ChainReader>,
}

impl WhitelistRegistry {
    /// `None` when the configured address is the zero sentinel.
    pub fn from_configured(address: Address, reader: Arc<dyn ChainReader>) -> Option<Self> {
        if address == Address::ZERO {
            None
        } else {
            Some(Self { address, reader })
        }
    }

    pub async fn contains(&self, account: Address) -> Result<bool, ReadError> {
        self.reader.list_contains(self.address, account).await
    }
}

async fn read_underlying(reader: &dyn ChainReader, pool: Address) -> Result<Token, ReadError> {
    let token = reader.token(pool).await?;
    let decimals = reader.decimals(token).await?;
    Ok(Token::new(token, u32::from(decimals)))
}

/// Elder generation pool.
#[derive(Debug)]
pub struct PoolV2Adapter {
    address: Address,
    reader: Arc<dyn ChainReader>,
    resolver: StrategyResolver,
    fee_exempt_pool: Address,
}

#[async_trait]
impl PoolAdapter for PoolV2Adapter {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> PoolVersion {
        PoolVersion::V2
    }

    fn interest_fee_units(&self) -> FeeUnits {
        FeeUnits::Underlying
    }

    async fn underlying_token(&self) -> Result<Token, ReadError> {
        read_underlying(self.reader.as_ref(), self.address).await
    }

    async fn share_decimals(&self) -> Result<u32, ReadError> {
        Ok(u32::from(self.reader.decimals(self.address).await?))
    }

    async fn fetch_supply(&self) -> Result<U256, ReadError> {
        self.reader.total_supply(self.address).await
    }

    async fn fetch_debt_or_locked_value(&self) -> Result<Option<U256>, ReadError> {
        // vVSP has no strategy debt
        if self.address == self.fee_exempt_pool {
            return Ok(None);
        }
        let strategy = self.resolver.resolve_strategy(self.address).await?;
        Ok(Some(strategy.total_locked().await?))
    }

    async fn fetch_withdraw_fee_rate(&self) -> Result<Decimal, AdapterError> {
        let raw = self.reader.withdraw_fee(self.address).await?;
        Ok(to_decimal_amount(raw, V2_FIXED_POINT_DECIMALS)?)
    }

    async fn fetch_conversion_rate(&self) -> Result<Decimal, AdapterError> {
        let raw = self
            .reader
            .price_per_share(self.address, PoolVersion::V2)
            .await?;
        Ok(to_decimal_amount(raw, V2_FIXED_POINT_DECIMALS)?)
    }

    async fn fetch_whitelist(&self) -> Result<Option<WhitelistRegistry>, ReadError> {
        let list = self
            .reader
            .fee_whitelist(self.address, PoolVersion::V2)
            .await?;
        Ok(WhitelistRegistry::from_configured(list, self.reader.clone()))
    }

    async fn fetch_fee_sources(&self) -> Result<Vec<Address>, ReadError> {
        let strategy = self.resolver.resolve_strategy_address(self.address).await?;
        Ok(vec![strategy])
    }
}

/// Newer generation pool.
#[derive(Debug)]
pub struct PoolV3Adapter {
    address: Address,
    reader: Arc<dyn ChainReader>,
}

#[async_trait]
impl PoolAdapter for PoolV3Adapter {
    fn address(&self) -> Address {
        self.address
    }

    fn version(&self) -> PoolVersion {
        PoolVersion::V3
    }

    fn interest_fee_units(&self) -> FeeUnits {
        FeeUnits::Shares
    }

    async fn underlying_token(&self) -> Result<Token, ReadError> {
        read_underlying(self.reader.as_ref(), self.address).await
    }

    async fn share_decimals(&self) -> Result<u32, ReadError> {
        Ok(u32::from(self.reader.decimals(self.address).await?))
    }

    async fn fetch_supply(&self) -> Result<U256, ReadError> {
        self.reader.total_supply(self.address).await
    }

    async fn fetch_debt_or_locked_value(&self) -> Result<Option<U256>, ReadError> {
        Ok(Some(self.reader.total_debt(self.address).await?))
    }

    async fn fetch_withdraw_fee_rate(&self) -> Result<Decimal, AdapterError> {
        let raw = self.reader.withdraw_fee(self.address).await?;
        Ok(to_decimal_amount(raw, V3_FEE_DECIMALS)?)
    }

    async fn fetch_conversion_rate(&self) -> Result<Decimal, AdapterError> {
        let token = self.underlying_token().await?;
        let raw = self
            .reader
            .price_per_share(self.address, PoolVersion::V3)
            .await?;
        Ok(to_decimal_amount(raw, token.decimals)?)
    }

    async fn fetch_whitelist(&self) -> Result<Option<WhitelistRegistry>, ReadError> {
        let list = self
            .reader
            .fee_whitelist(self.address, PoolVersion::V3)
            .await?;
        Ok(WhitelistRegistry::from_configured(list, self.reader.clone()))
    }

    async fn fetch_fee_sources(&self) -> Result<Vec<Address>, ReadError> {
        self.reader.strategies(self.address).await
    }
}
