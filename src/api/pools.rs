use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::domain::{address_key, parse_address, Pool};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolsResponse {
    pub pool_count: usize,
    pub pools: Vec<PoolDto>,
}

/// Pool entity with every amount as a canonical decimal string.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolDto {
    pub id: String,
    pub version: String,
    pub total_supply: String,
    pub total_supply_usd: String,
    pub total_debt: String,
    pub total_debt_usd: String,
    pub protocol_revenue: String,
    pub protocol_revenue_usd: String,
    pub supply_side_revenue: String,
    pub supply_side_revenue_usd: String,
    pub total_revenue: String,
    pub total_revenue_usd: String,
}

impl From<Pool> for PoolDto {
    fn from(pool: Pool) -> Self {
        Self {
            id: pool.id,
            version: pool.version.to_string(),
            total_supply: pool.total_supply.to_string(),
            total_supply_usd: pool.total_supply_usd.to_canonical_string(),
            total_debt: pool.total_debt.to_string(),
            total_debt_usd: pool.total_debt_usd.to_canonical_string(),
            protocol_revenue: pool.protocol_revenue.to_canonical_string(),
            protocol_revenue_usd: pool.protocol_revenue_usd.to_canonical_string(),
            supply_side_revenue: pool.supply_side_revenue.to_canonical_string(),
            supply_side_revenue_usd: pool.supply_side_revenue_usd.to_canonical_string(),
            total_revenue: pool.total_revenue.to_canonical_string(),
            total_revenue_usd: pool.total_revenue_usd.to_canonical_string(),
        }
    }
}

pub async fn list_pools(State(state): State<AppState>) -> Result<Json<PoolsResponse>, AppError> {
    let pools: Vec<PoolDto> = state
        .repo
        .list_pools()
        .await?
        .into_iter()
        .map(PoolDto::from)
        .collect();

    Ok(Json(PoolsResponse {
        pool_count: pools.len(),
        pools,
    }))
}

pub async fn get_pool(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PoolDto>, AppError> {
    let address = parse_address(&address)
        .map_err(|_| AppError::BadRequest("Invalid pool address".into()))?;
    let id = address_key(&address);

    let pool = state
        .repo
        .load_pool(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("pool {}", id)))?;

    Ok(Json(PoolDto::from(pool)))
}
