//! Interest fee accrual from strategy deposits (V2) and strategy mints (V3).

use super::{HandleOutcome, HandlerContext};
use crate::domain::{address_key, to_decimal_amount, Address, Decimal, LogMeta, PoolVersion, U256};
use crate::engine::FeeUnits;
use tracing::{debug, info, warn};

/// A V2 `Deposit`: interest when the depositor is the pool's strategy.
pub async fn handle_strategy_deposit(
    ctx: &HandlerContext<'_>,
    pool_address: Address,
    version: PoolVersion,
    owner: Address,
    amount: U256,
    meta: &LogMeta,
) -> Result<HandleOutcome, sqlx::Error> {
    accrue_interest(ctx, pool_address, version, FeeUnits::Underlying, owner, amount, meta).await
}

/// A V3 `Transfer`: interest when it mints shares to a registered strategy.
pub async fn handle_mint_to_strategy(
    ctx: &HandlerContext<'_>,
    pool_address: Address,
    version: PoolVersion,
    from: Address,
    to: Address,
    value: U256,
    meta: &LogMeta,
) -> Result<HandleOutcome, sqlx::Error> {
    if from != Address::ZERO {
        return Ok(HandleOutcome::NotApplicable("transfer is not a mint"));
    }
    accrue_interest(ctx, pool_address, version, FeeUnits::Shares, to, value, meta).await
}

async fn accrue_interest(
    ctx: &HandlerContext<'_>,
    pool_address: Address,
    version: PoolVersion,
    event_units: FeeUnits,
    recipient: Address,
    raw_amount: U256,
    meta: &LogMeta,
) -> Result<HandleOutcome, sqlx::Error> {
    let pool_id = address_key(&pool_address);

    if pool_address == ctx.contracts.fee_exempt_pool {
        return Ok(HandleOutcome::NotApplicable("fee-exempt pool"));
    }

    let adapter = ctx.adapter(pool_address, version);

    if adapter.interest_fee_units() != event_units {
        debug!(pool = %pool_id, version = %version, "event does not carry interest for this generation");
        return Ok(HandleOutcome::NotApplicable("event kind not used by pool version"));
    }

    let fee_sources = match adapter.fetch_fee_sources().await {
        Ok(sources) => sources,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "strategies unavailable, dropping event");
            return Ok(HandleOutcome::Dropped("strategies unavailable"));
        }
    };
    if !fee_sources.contains(&recipient) {
        debug!(pool = %pool_id, account = %address_key(&recipient), "not a strategy");
        return Ok(HandleOutcome::NotApplicable("counterparty is not a strategy"));
    }

    let token = match adapter.underlying_token().await {
        Ok(token) => token,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "underlying token unavailable, dropping event");
            return Ok(HandleOutcome::Dropped("underlying token unavailable"));
        }
    };

    let (decimals, conversion_rate) = match event_units {
        FeeUnits::Underlying => (token.decimals, Decimal::one()),
        FeeUnits::Shares => {
            let rate = adapter.fetch_conversion_rate().await;
            let share_decimals = adapter.share_decimals().await;
            match (share_decimals, rate) {
                (Ok(decimals), Ok(rate)) => (decimals, rate),
                (Err(e), _) => {
                    warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "share decimals unavailable, dropping mint");
                    return Ok(HandleOutcome::Dropped("share decimals unavailable"));
                }
                (_, Err(e)) => {
                    warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "conversion rate unavailable, dropping mint");
                    return Ok(HandleOutcome::Dropped("conversion rate unavailable"));
                }
            }
        }
    };

    let interest = match to_decimal_amount(raw_amount, decimals) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "interest amount not representable");
            return Ok(HandleOutcome::Dropped("amount not representable"));
        }
    };

    let revenue = match ctx
        .calculator
        .compute_revenue(interest, conversion_rate, &token)
        .await
    {
        Ok(revenue) => revenue,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "interest revenue not representable");
            return Ok(HandleOutcome::Dropped("revenue not representable"));
        }
    };

    let outcome = ctx.record_revenue(pool_address, version, &revenue).await?;
    if outcome == HandleOutcome::Applied {
        info!(
            pool = %pool_id,
            tx = %meta.tx_hash,
            strategy = %address_key(&recipient),
            interest = %interest,
            total_revenue = %revenue.total().unwrap_or_default(),
            total_revenue_usd = %revenue.total_usd().unwrap_or_default(),
            "interest fee applied"
        );
    }
    Ok(outcome)
}
