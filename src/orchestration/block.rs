//! Periodic supply and debt snapshots.

use super::{HandleOutcome, HandlerContext};
use crate::domain::{
    address_key, shares_to_underlying, to_decimal_amount, Address, Decimal, PoolVersion, Token,
    U256,
};
use crate::engine::PoolAdapter;
use tracing::{debug, info, warn};

/// Refresh the supply and debt gauges of one pool.
///
/// Each gauge is read independently; an unavailable read skips that gauge only.
pub async fn handle_block_tick(
    ctx: &HandlerContext<'_>,
    pool_address: Address,
    version: PoolVersion,
    block_number: u64,
) -> Result<HandleOutcome, sqlx::Error> {
    let pool_id = address_key(&pool_address);
    let adapter = ctx.adapter(pool_address, version);

    let token = match adapter.underlying_token().await {
        Ok(token) => token,
        Err(e) => {
            warn!(pool = %pool_id, block = block_number, error = %e, "underlying token unavailable, skipping tick");
            return Ok(HandleOutcome::Dropped("underlying token unavailable"));
        }
    };

    let mut pool = ctx.ledger.load_or_create(&pool_address, version).await?;
    let mut updated = false;

    if let Some((raw_supply, supply_usd)) = supply_gauge(ctx, adapter.as_ref(), &token).await {
        ctx.ledger
            .apply_supply_snapshot(&mut pool, raw_supply, supply_usd)
            .await?;
        updated = true;
    }

    if let Some((raw_debt, debt_usd)) = debt_gauge(ctx, adapter.as_ref(), &token).await {
        ctx.ledger
            .apply_debt_snapshot(&mut pool, raw_debt, debt_usd)
            .await?;
        updated = true;
    }

    if !updated {
        ctx.ledger.save(&pool).await?;
    }

    info!(
        pool = %pool_id,
        block = block_number,
        total_supply_usd = %pool.total_supply_usd,
        total_debt_usd = %pool.total_debt_usd,
        "block tick applied"
    );
    Ok(HandleOutcome::Applied)
}

async fn supply_gauge(
    ctx: &HandlerContext<'_>,
    adapter: &dyn PoolAdapter,
    token: &Token,
) -> Option<(U256, Decimal)> {
    let pool_id = address_key(&adapter.address());

    let raw_supply = adapter
        .fetch_supply()
        .await
        .map_err(|e| warn!(pool = %pool_id, error = %e, "total supply unavailable"))
        .ok()?;
    let share_decimals = adapter
        .share_decimals()
        .await
        .map_err(|e| warn!(pool = %pool_id, error = %e, "share decimals unavailable"))
        .ok()?;
    let rate = adapter
        .fetch_conversion_rate()
        .await
        .map_err(|e| warn!(pool = %pool_id, error = %e, "conversion rate unavailable, skipping supply"))
        .ok()?;
    let shares = to_decimal_amount(raw_supply, share_decimals)
        .map_err(|e| warn!(pool = %pool_id, error = %e, "total supply not representable"))
        .ok()?;

    let Some(underlying) = shares_to_underlying(shares, rate) else {
        warn!(pool = %pool_id, shares = %shares, rate = %rate, "supply in underlying overflows");
        return None;
    };
    let supply_usd = ctx.oracle.quote_usd(underlying, token).await;
    Some((raw_supply, supply_usd))
}

async fn debt_gauge(
    ctx: &HandlerContext<'_>,
    adapter: &dyn PoolAdapter,
    token: &Token,
) -> Option<(U256, Decimal)> {
    let pool_id = address_key(&adapter.address());

    let raw_debt = match adapter.fetch_debt_or_locked_value().await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!(pool = %pool_id, "pool carries no debt");
            return None;
        }
        Err(e) => {
            warn!(pool = %pool_id, error = %e, "debt unavailable");
            return None;
        }
    };
    let debt = to_decimal_amount(raw_debt, token.decimals)
        .map_err(|e| warn!(pool = %pool_id, error = %e, "debt not representable"))
        .ok()?;

    let debt_usd = ctx.oracle.quote_usd(debt, token).await;
    Some((raw_debt, debt_usd))
}
