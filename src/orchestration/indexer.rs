use super::{block, interest, withdraw, HandleOutcome, HandlerContext};
use crate::config::Config;
use crate::datasource::ChainReader;
use crate::db::{ProcessedEvent, Repository};
use crate::domain::ChainEvent;
use crate::engine::PoolLedger;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Dispatches host events to the handlers, one at a time.
#[derive(Clone)]
pub struct Indexer {
    reader: Arc<dyn ChainReader>,
    repo: Arc<Repository>,
    ledger: PoolLedger,
    config: Config,
}

impl Indexer {
    pub fn new(reader: Arc<dyn ChainReader>, repo: Arc<Repository>, config: Config) -> Self {
        Self {
            reader,
            ledger: PoolLedger::new(repo.clone()),
            repo,
            config,
        }
    }

    /// Handle one event with every read pinned to its block.
    ///
    /// With dedup enabled, log events already applied under the same
    /// (tx hash, log index) are skipped, and the marker is committed in the same
    /// transaction as the revenue. Block ticks are never deduplicated.
    pub async fn handle(&self, event: &ChainEvent) -> Result<HandleOutcome, IndexerError> {
        let processed_event = match (self.config.dedup_events, event.log_meta()) {
            (true, Some(meta)) => Some(ProcessedEvent {
                key: meta.event_key(),
                block_number: meta.block_number,
            }),
            _ => None,
        };
        if let Some(processed) = &processed_event {
            if self.repo.is_event_processed(&processed.key).await? {
                debug!(event = %processed.key, pool = %event.pool_key(), "event already applied");
                return Ok(HandleOutcome::Duplicate);
            }
        }

        let ctx = HandlerContext::new(
            self.reader.at_block(event.block_number()),
            &self.config.contracts,
            &self.ledger,
            processed_event,
        );

        let outcome = match event {
            ChainEvent::Block {
                pool,
                version,
                block_number,
            } => block::handle_block_tick(&ctx, *pool, *version, *block_number).await?,
            ChainEvent::Withdraw {
                pool,
                version,
                owner,
                shares,
                meta,
            } => withdraw::handle_withdraw_fee(&ctx, *pool, *version, *owner, *shares, meta).await?,
            ChainEvent::Deposit {
                pool,
                version,
                owner,
                amount,
                meta,
            } => {
                interest::handle_strategy_deposit(&ctx, *pool, *version, *owner, *amount, meta)
                    .await?
            }
            ChainEvent::Transfer {
                pool,
                version,
                from,
                to,
                value,
                meta,
            } => {
                interest::handle_mint_to_strategy(&ctx, *pool, *version, *from, *to, *value, meta)
                    .await?
            }
        };

        match outcome {
            HandleOutcome::NotApplicable(reason) => {
                debug!(kind = event.kind(), pool = %event.pool_key(), reason, "event not applicable")
            }
            HandleOutcome::Dropped(reason) => {
                info!(kind = event.kind(), pool = %event.pool_key(), reason, "event dropped")
            }
            HandleOutcome::Duplicate => {
                debug!(kind = event.kind(), pool = %event.pool_key(), "event already applied")
            }
            HandleOutcome::Applied => {}
        }
        Ok(outcome)
    }
}

/// Only persistence failures abort an event.
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
