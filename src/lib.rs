pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use config::{Config, ContractsConfig};
pub use datasource::{ChainReader, MockChainReader, ReadError, RpcChainReader};
pub use db::{init_db, Repository};
pub use domain::{Address, ChainEvent, Decimal, Pool, PoolVersion, Revenue, U256};
pub use error::AppError;
pub use orchestration::{HandleOutcome, Indexer, IndexerError};
