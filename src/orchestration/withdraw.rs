//! Withdraw fee accrual.

use super::{HandleOutcome, HandlerContext};
use crate::domain::{address_key, to_decimal_amount, Address, LogMeta, PoolVersion, U256};
use tracing::{info, warn};

/// Account the fee charged on a withdrawal of `shares` by `owner`.
///
/// No-op for the fee-exempt pool and for whitelisted owners. The event is dropped
/// when the fee rate or the share-to-token rate cannot be read.
pub async fn handle_withdraw_fee(
    ctx: &HandlerContext<'_>,
    pool_address: Address,
    version: PoolVersion,
    owner: Address,
    shares: U256,
    meta: &LogMeta,
) -> Result<HandleOutcome, sqlx::Error> {
    let pool_id = address_key(&pool_address);

    if pool_address == ctx.contracts.fee_exempt_pool {
        return Ok(HandleOutcome::NotApplicable("fee-exempt pool"));
    }

    let adapter = ctx.adapter(pool_address, version);

    let whitelist = match adapter.fetch_whitelist().await {
        Ok(whitelist) => whitelist,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "fee whitelist unavailable, dropping withdraw");
            return Ok(HandleOutcome::Dropped("fee whitelist unavailable"));
        }
    };
    if let Some(registry) = whitelist {
        match registry.contains(owner).await {
            Ok(true) => {
                info!(pool = %pool_id, owner = %address_key(&owner), "owner is fee whitelisted");
                return Ok(HandleOutcome::NotApplicable("owner whitelisted"));
            }
            Ok(false) => {}
            Err(e) => {
                warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "whitelist lookup failed, dropping withdraw");
                return Ok(HandleOutcome::Dropped("whitelist lookup failed"));
            }
        }
    }

    let fee_rate = match adapter.fetch_withdraw_fee_rate().await {
        Ok(rate) => rate,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "withdraw fee unavailable, dropping withdraw");
            return Ok(HandleOutcome::Dropped("withdraw fee unavailable"));
        }
    };
    let conversion_rate = match adapter.fetch_conversion_rate().await {
        Ok(rate) => rate,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "conversion rate unavailable, dropping withdraw");
            return Ok(HandleOutcome::Dropped("conversion rate unavailable"));
        }
    };
    let (token, share_decimals) = match (adapter.underlying_token().await, adapter.share_decimals().await) {
        (Ok(token), Ok(decimals)) => (token, decimals),
        (Err(e), _) | (_, Err(e)) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "token metadata unavailable, dropping withdraw");
            return Ok(HandleOutcome::Dropped("token metadata unavailable"));
        }
    };
    let withdrawn = match to_decimal_amount(shares, share_decimals) {
        Ok(amount) => amount,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "withdrawn shares not representable");
            return Ok(HandleOutcome::Dropped("shares not representable"));
        }
    };

    let Some(fee) = withdrawn.checked_mul(fee_rate) else {
        warn!(pool = %pool_id, tx = %meta.tx_hash, withdrawn = %withdrawn, fee_rate = %fee_rate, "withdraw fee overflows");
        return Ok(HandleOutcome::Dropped("fee not representable"));
    };
    let revenue = match ctx
        .calculator
        .compute_revenue(fee, conversion_rate, &token)
        .await
    {
        Ok(revenue) => revenue,
        Err(e) => {
            warn!(pool = %pool_id, tx = %meta.tx_hash, error = %e, "withdraw revenue not representable");
            return Ok(HandleOutcome::Dropped("revenue not representable"));
        }
    };

    let outcome = ctx.record_revenue(pool_address, version, &revenue).await?;
    if outcome == HandleOutcome::Applied {
        info!(
            pool = %pool_id,
            tx = %meta.tx_hash,
            fee = %fee,
            protocol_revenue = %revenue.protocol_revenue,
            supply_side_revenue = %revenue.supply_side_revenue,
            total_revenue_usd = %revenue.total_usd().unwrap_or_default(),
            "withdraw fee applied"
        );
    }
    Ok(outcome)
}
