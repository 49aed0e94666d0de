//! Revenue computation, pricing and pool-generation adapters.

pub mod adapter;
pub mod ledger;
pub mod oracle;
pub mod resolver;
pub mod revenue;

pub use adapter::{pool_adapter, AdapterError, FeeUnits, PoolAdapter, WhitelistRegistry};
pub use ledger::{PoolLedger, RevenueWrite};
pub use oracle::{OracleError, PriceOracle};
pub use resolver::{StrategyHandle, StrategyResolver};
pub use revenue::{split_fee, RevenueCalculator, RevenueError, PROTOCOL_SHARE, SUPPLY_SIDE_SHARE};
