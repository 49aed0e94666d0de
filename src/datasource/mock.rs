//! In-memory chain reader for tests.
//!
//! Every accessor answers from a table filled through the `with_*` builders; a
//! missing entry behaves like a reverted call.

use super::{ChainReader, ReadError};
use crate::domain::{Address, PoolVersion, U256};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct MockChainReader {
    tokens: HashMap<Address, Address>,
    decimals: HashMap<Address, u8>,
    total_supply: HashMap<Address, U256>,
    total_debt: HashMap<Address, U256>,
    withdraw_fee: HashMap<Address, U256>,
    fee_whitelist: HashMap<Address, Address>,
    price_per_share: HashMap<Address, U256>,
    strategies: HashMap<Address, Vec<Address>>,
    controller_strategies: HashMap<(Address, Address), Address>,
    total_locked: HashMap<Address, U256>,
    address_lists: HashMap<Address, HashSet<Address>>,
    /// Router output (in USD-token raw units) for one whole unit of the path's first token.
    usd_quotes: HashMap<Address, U256>,

    quote_paths: Arc<Mutex<Vec<Vec<Address>>>>,
    pinned_blocks: Arc<Mutex<Vec<u64>>>,
    call_count: Arc<AtomicUsize>,
}

impl MockChainReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, pool: Address, token: Address) -> Self {
        self.tokens.insert(pool, token);
        self
    }

    pub fn with_decimals(mut self, contract: Address, decimals: u8) -> Self {
        self.decimals.insert(contract, decimals);
        self
    }

    pub fn with_total_supply(mut self, pool: Address, supply: U256) -> Self {
        self.total_supply.insert(pool, supply);
        self
    }

    pub fn with_total_debt(mut self, pool: Address, debt: U256) -> Self {
        self.total_debt.insert(pool, debt);
        self
    }

    pub fn with_withdraw_fee(mut self, pool: Address, fee: U256) -> Self {
        self.withdraw_fee.insert(pool, fee);
        self
    }

    pub fn with_fee_whitelist(mut self, pool: Address, list: Address) -> Self {
        self.fee_whitelist.insert(pool, list);
        self
    }

    pub fn with_price_per_share(mut self, pool: Address, price: U256) -> Self {
        self.price_per_share.insert(pool, price);
        self
    }

    pub fn with_strategies(mut self, pool: Address, strategies: Vec<Address>) -> Self {
        self.strategies.insert(pool, strategies);
        self
    }

    pub fn with_controller_strategy(
        mut self,
        controller: Address,
        pool: Address,
        strategy: Address,
    ) -> Self {
        self.controller_strategies.insert((controller, pool), strategy);
        self
    }

    pub fn with_total_locked(mut self, strategy: Address, locked: U256) -> Self {
        self.total_locked.insert(strategy, locked);
        self
    }

    pub fn with_address_list(mut self, list: Address, members: Vec<Address>) -> Self {
        self.address_lists.insert(list, members.into_iter().collect());
        self
    }

    pub fn with_usd_quote(mut self, token: Address, usd_out: U256) -> Self {
        self.usd_quotes.insert(token, usd_out);
        self
    }

    /// Paths passed to `amounts_out`, in call order.
    pub fn quote_paths(&self) -> Vec<Vec<Address>> {
        self.quote_paths.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Blocks requested through `at_block`, in call order.
    pub fn pinned_blocks(&self) -> Vec<u64> {
        self.pinned_blocks.lock().map(|b| b.clone()).unwrap_or_default()
    }

    /// Total number of contract reads served.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    fn lookup<K, V>(
        &self,
        table: &HashMap<K, V>,
        key: &K,
        contract: Address,
        method: &'static str,
    ) -> Result<V, ReadError>
    where
        K: std::hash::Hash + Eq,
        V: Clone,
    {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        table
            .get(key)
            .cloned()
            .ok_or_else(|| ReadError::reverted(contract, method))
    }
}

#[async_trait]
impl ChainReader for MockChainReader {
    fn at_block(&self, block_number: u64) -> Arc<dyn ChainReader> {
        if let Ok(mut blocks) = self.pinned_blocks.lock() {
            blocks.push(block_number);
        }
        Arc::new(self.clone())
    }

    async fn token(&self, pool: Address) -> Result<Address, ReadError> {
        self.lookup(&self.tokens, &pool, pool, "token()")
    }

    async fn decimals(&self, contract: Address) -> Result<u8, ReadError> {
        self.lookup(&self.decimals, &contract, contract, "decimals()")
    }

    async fn total_supply(&self, pool: Address) -> Result<U256, ReadError> {
        self.lookup(&self.total_supply, &pool, pool, "totalSupply()")
    }

    async fn total_debt(&self, pool: Address) -> Result<U256, ReadError> {
        self.lookup(&self.total_debt, &pool, pool, "totalDebt()")
    }

    async fn withdraw_fee(&self, pool: Address) -> Result<U256, ReadError> {
        self.lookup(&self.withdraw_fee, &pool, pool, "withdrawFee()")
    }

    async fn fee_whitelist(
        &self,
        pool: Address,
        version: PoolVersion,
    ) -> Result<Address, ReadError> {
        let method = match version {
            PoolVersion::V2 => "feeWhiteList()",
            PoolVersion::V3 => "feeWhitelist()",
        };
        self.lookup(&self.fee_whitelist, &pool, pool, method)
    }

    async fn price_per_share(
        &self,
        pool: Address,
        version: PoolVersion,
    ) -> Result<U256, ReadError> {
        let method = match version {
            PoolVersion::V2 => "getPricePerShare()",
            PoolVersion::V3 => "pricePerShare()",
        };
        self.lookup(&self.price_per_share, &pool, pool, method)
    }

    async fn strategies(&self, pool: Address) -> Result<Vec<Address>, ReadError> {
        self.lookup(&self.strategies, &pool, pool, "getStrategies()")
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        pool: Address,
    ) -> Result<Address, ReadError> {
        self.lookup(
            &self.controller_strategies,
            &(controller, pool),
            controller,
            "strategy(address)",
        )
    }

    async fn total_locked(&self, strategy: Address) -> Result<U256, ReadError> {
        self.lookup(&self.total_locked, &strategy, strategy, "totalLocked()")
    }

    async fn list_contains(&self, list: Address, account: Address) -> Result<bool, ReadError> {
        let members = self.lookup(&self.address_lists, &list, list, "contains(address)")?;
        Ok(members.contains(&account))
    }

    async fn amounts_out(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<Vec<U256>, ReadError> {
        if let Ok(mut paths) = self.quote_paths.lock() {
            paths.push(path.clone());
        }
        let first = path
            .first()
            .copied()
            .ok_or_else(|| ReadError::reverted(router, "getAmountsOut(uint256,address[])"))?;
        let usd_out = self.lookup(
            &self.usd_quotes,
            &first,
            router,
            "getAmountsOut(uint256,address[])",
        )?;

        let mut amounts = vec![amount_in; path.len().saturating_sub(1)];
        amounts.push(usd_out);
        Ok(amounts)
    }
}
