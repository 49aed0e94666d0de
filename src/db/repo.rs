//! Key-value entity store for pools.

use crate::domain::{Decimal, Pool, PoolVersion, U256};
use sqlx::sqlite::{Sqlite, SqlitePool, SqliteRow};
use sqlx::{Executor, Row};
use std::str::FromStr;

/// Identity of a log event whose revenue is being written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEvent {
    /// `txhash:logindex`
    pub key: String,
    pub block_number: u64,
}

/// Repository for persisted ledger entities.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    /// Cheap round trip used by the readiness probe.
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Load a pool by its lowercase hex id.
    pub async fn load_pool(&self, id: &str) -> Result<Option<Pool>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, version, total_supply, total_supply_usd, total_debt, total_debt_usd,
                   protocol_revenue, protocol_revenue_usd, supply_side_revenue,
                   supply_side_revenue_usd, total_revenue, total_revenue_usd
            FROM pools
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| pool_from_row(&r)).transpose()
    }

    /// All pools ordered by id.
    pub async fn list_pools(&self) -> Result<Vec<Pool>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, version, total_supply, total_supply_usd, total_debt, total_debt_usd,
                   protocol_revenue, protocol_revenue_usd, supply_side_revenue,
                   supply_side_revenue_usd, total_revenue, total_revenue_usd
            FROM pools
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(pool_from_row).collect()
    }

    /// Insert or fully overwrite a pool row.
    pub async fn upsert_pool(&self, pool: &Pool) -> Result<(), sqlx::Error> {
        write_pool(&self.pool, pool).await
    }

    /// Overwrite a pool row and record the event that produced it, in one transaction.
    ///
    /// Returns false and writes nothing if the event was already recorded.
    pub async fn upsert_pool_with_event(
        &self,
        pool: &Pool,
        event: &ProcessedEvent,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO processed_events (event_key, pool_id, block_number, processed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(event_key) DO NOTHING
            "#,
        )
        .bind(event.key.as_str())
        .bind(pool.id.as_str())
        .bind(event.block_number as i64)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        write_pool(&mut *tx, pool).await?;
        tx.commit().await?;
        Ok(true)
    }

    pub async fn is_event_processed(&self, event_key: &str) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM processed_events WHERE event_key = ?")
            .bind(event_key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

async fn write_pool<'e, E>(executor: E, pool: &Pool) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO pools (
            id, version, total_supply, total_supply_usd, total_debt, total_debt_usd,
            protocol_revenue, protocol_revenue_usd, supply_side_revenue,
            supply_side_revenue_usd, total_revenue, total_revenue_usd, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            version = excluded.version,
            total_supply = excluded.total_supply,
            total_supply_usd = excluded.total_supply_usd,
            total_debt = excluded.total_debt,
            total_debt_usd = excluded.total_debt_usd,
            protocol_revenue = excluded.protocol_revenue,
            protocol_revenue_usd = excluded.protocol_revenue_usd,
            supply_side_revenue = excluded.supply_side_revenue,
            supply_side_revenue_usd = excluded.supply_side_revenue_usd,
            total_revenue = excluded.total_revenue,
            total_revenue_usd = excluded.total_revenue_usd,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(pool.id.as_str())
    .bind(pool.version.as_str())
    .bind(pool.total_supply.to_string())
    .bind(pool.total_supply_usd.to_canonical_string())
    .bind(pool.total_debt.to_string())
    .bind(pool.total_debt_usd.to_canonical_string())
    .bind(pool.protocol_revenue.to_canonical_string())
    .bind(pool.protocol_revenue_usd.to_canonical_string())
    .bind(pool.supply_side_revenue.to_canonical_string())
    .bind(pool.supply_side_revenue_usd.to_canonical_string())
    .bind(pool.total_revenue.to_canonical_string())
    .bind(pool.total_revenue_usd.to_canonical_string())
    .bind(chrono::Utc::now().timestamp_millis())
    .execute(executor)
    .await?;

    Ok(())
}

fn decode_err(column: &str, value: &str, error: impl std::fmt::Display) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("invalid value {:?}: {}", value, error).into(),
    }
}

fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    Decimal::from_str(&raw).map_err(|e| decode_err(column, &raw, e))
}

fn u256_column(row: &SqliteRow, column: &str) -> Result<U256, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    U256::from_str_radix(&raw, 10).map_err(|e| decode_err(column, &raw, e))
}

fn pool_from_row(row: &SqliteRow) -> Result<Pool, sqlx::Error> {
    let version_raw: String = row.try_get("version")?;
    let version =
        PoolVersion::from_str(&version_raw).map_err(|e| decode_err("version", &version_raw, e))?;

    Ok(Pool {
        id: row.try_get("id")?,
        version,
        total_supply: u256_column(row, "total_supply")?,
        total_supply_usd: decimal_column(row, "total_supply_usd")?,
        total_debt: u256_column(row, "total_debt")?,
        total_debt_usd: decimal_column(row, "total_debt_usd")?,
        protocol_revenue: decimal_column(row, "protocol_revenue")?,
        protocol_revenue_usd: decimal_column(row, "protocol_revenue_usd")?,
        supply_side_revenue: decimal_column(row, "supply_side_revenue")?,
        supply_side_revenue_usd: decimal_column(row, "supply_side_revenue_usd")?,
        total_revenue: decimal_column(row, "total_revenue")?,
        total_revenue_usd: decimal_column(row, "total_revenue_usd")?,
    })
}
