//! Domain types for pool revenue accounting.
//!
//! This module provides:
//! - Lossless numeric handling via the Decimal wrapper and unit scaling helpers
//! - Chain primitives: Address, U256, PoolVersion, Token
//! - The persisted Pool entity and the per-event Revenue delta
//! - Decoded host events

pub mod decimal;
pub mod event;
pub mod pool;
pub mod primitives;
pub mod revenue;
pub mod units;

pub use decimal::Decimal;
pub use event::{ChainEvent, LogMeta};
pub use pool::{Pool, RevenueOverflow};
pub use primitives::{
    address_key, parse_address, Address, AddressParseError, PoolVersion, Token, B256, U256,
};
pub use revenue::Revenue;
pub use units::{decimal_divisor, one_unit, shares_to_underlying, to_decimal_amount, UnitsError};
