//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database
//! operations. Methods are organized across submodules by domain:
//! - `inventory.rs` - product and inventory item operations
//! - `orders.rs` - order lookup, listing, payout confirmation
//! - `analytics.rs` - profitability and brand aggregates

mod analytics;
mod inventory;
mod orders;

pub use analytics::{BrandStats, InventorySnapshot, ProfitSummary};

use crate::domain::{Decimal, Order, OrderDraft, Platform, PlatformFeeSchedule};
use chrono::{TimeZone, Utc};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// Result of attempting to persist a reconciled order atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderPersistOutcome {
    /// Order row created and item flipped to sold.
    Created(Order),
    /// The (platform, external_id) key already exists. Nothing written.
    DuplicateExternalId,
    /// The item was no longer in stock at write time (lost race).
    /// The transaction rolled back; nothing written.
    ItemUnavailable,
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Platform operations
    // =========================================================================

    /// Insert or refresh a platform fee schedule row, returning its id.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_platform(
        &self,
        schedule: &PlatformFeeSchedule,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO platforms (name, percentage_fee, fixed_processing_fee, currency)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                percentage_fee = excluded.percentage_fee,
                fixed_processing_fee = excluded.fixed_processing_fee,
                currency = excluded.currency
            "#,
        )
        .bind(schedule.platform.as_str())
        .bind(schedule.percentage_fee.to_canonical_string())
        .bind(schedule.fixed_processing_fee.to_canonical_string())
        .bind(&schedule.currency)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query("SELECT id FROM platforms WHERE name = ?")
            .bind(schedule.platform.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("id"))
    }

    /// Look up a platform row id by name.
    pub async fn platform_id(&self, platform: &Platform) -> Result<Option<i64>, sqlx::Error> {
        let row = sqlx::query("SELECT id FROM platforms WHERE name = ?")
            .bind(platform.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("id")))
    }

    // =========================================================================
    // Transaction coordination (spans orders and inventory)
    // =========================================================================

    /// Persist a reconciled order and flip its item to `sold` atomically.
    ///
    /// The order insert relies on the unique (platform_id, external_id)
    /// index as the authoritative dedup guard; the status update is
    /// conditioned on the item still being `in_stock` so a lost race rolls
    /// the whole transaction back. Partial application (order without
    /// status flip, or the reverse) cannot be observed.
    ///
    /// # Errors
    /// Returns an error if any statement fails; the transaction is dropped
    /// and nothing is written.
    pub async fn create_order_atomic(
        &self,
        draft: &OrderDraft,
    ) -> Result<OrderPersistOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let platform_row = sqlx::query("SELECT id FROM platforms WHERE name = ?")
            .bind(draft.platform.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let platform_id: i64 = platform_row.get("id");

        let created_at_ms = Utc::now().timestamp_millis();
        let insert = sqlx::query(
            r#"
            INSERT INTO orders (
                inventory_item_id, platform_id, external_id, sold_at,
                gross_sale, platform_fee, net_proceeds, gross_profit,
                net_profit, roi_percent, shelf_life_days,
                payout_received, payout_date, source_payload, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, NULL, ?, ?)
            ON CONFLICT(platform_id, external_id) DO NOTHING
            "#,
        )
        .bind(draft.inventory_item_id)
        .bind(platform_id)
        .bind(&draft.external_id)
        .bind(draft.sold_at.timestamp_millis())
        .bind(draft.gross_sale.to_canonical_string())
        .bind(draft.platform_fee.to_canonical_string())
        .bind(draft.net_proceeds.to_canonical_string())
        .bind(draft.gross_profit.to_canonical_string())
        .bind(draft.net_profit.to_canonical_string())
        .bind(draft.roi_percent.map(|r| r.to_canonical_string()))
        .bind(draft.shelf_life_days)
        .bind(draft.source_payload.to_string())
        .bind(created_at_ms)
        .execute(&mut *tx)
        .await?;

        if insert.rows_affected() == 0 {
            // Dropping tx rolls back; no writes happened anyway.
            return Ok(OrderPersistOutcome::DuplicateExternalId);
        }
        let order_id = insert.last_insert_rowid();

        let flip = sqlx::query(
            "UPDATE inventory_items SET status = 'sold' WHERE id = ? AND status = 'in_stock'",
        )
        .bind(draft.inventory_item_id)
        .execute(&mut *tx)
        .await?;

        if flip.rows_affected() == 0 {
            // Compare-and-set lost: the item was sold (or pulled) between
            // resolution and write. Roll back the order insert with the tx.
            return Ok(OrderPersistOutcome::ItemUnavailable);
        }

        tx.commit().await?;

        Ok(OrderPersistOutcome::Created(Order {
            id: order_id,
            inventory_item_id: draft.inventory_item_id,
            platform: draft.platform.clone(),
            external_id: draft.external_id.clone(),
            sold_at: draft.sold_at,
            gross_sale: draft.gross_sale,
            platform_fee: draft.platform_fee,
            net_proceeds: draft.net_proceeds,
            gross_profit: draft.gross_profit,
            net_profit: draft.net_profit,
            roi_percent: draft.roi_percent,
            shelf_life_days: draft.shelf_life_days,
            payout_received: false,
            payout_date: None,
            created_at: millis_to_datetime(created_at_ms),
        }))
    }
}

/// Parse a stored canonical decimal, falling back to zero with a warning.
///
/// Stored values are written by this crate, so a parse failure means the
/// row was edited by hand; analytics should degrade, not crash.
pub(crate) fn parse_stored_decimal(column: &str, value: &str) -> Decimal {
    Decimal::from_str(value).unwrap_or_else(|e| {
        warn!(column = column, value = value, error = %e, "Failed to parse stored decimal, using 0");
        Decimal::zero()
    })
}

pub(crate) fn millis_to_datetime(ms: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(|| {
        warn!(ms = ms, "Out-of-range timestamp in database, using epoch");
        Utc.timestamp_millis_opt(0).single().unwrap_or_default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use std::str::FromStr;
    use tempfile::TempDir;

    async fn setup_test_db() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();
        let pool = init_db(&db_path).await.expect("init_db failed");
        (Repository::new(pool), temp_dir)
    }

    fn stockx_schedule() -> PlatformFeeSchedule {
        PlatformFeeSchedule::new(
            Platform::new("stockx"),
            Decimal::from_str("0.095").unwrap(),
            Decimal::from_str("1.5").unwrap(),
            "EUR",
        )
    }

    #[tokio::test]
    async fn test_upsert_platform_is_stable() {
        let (repo, _temp) = setup_test_db().await;

        let id1 = repo.upsert_platform(&stockx_schedule()).await.unwrap();
        let id2 = repo.upsert_platform(&stockx_schedule()).await.unwrap();
        assert_eq!(id1, id2);

        let found = repo.platform_id(&Platform::new("StockX")).await.unwrap();
        assert_eq!(found, Some(id1));
    }

    #[tokio::test]
    async fn test_platform_id_unknown() {
        let (repo, _temp) = setup_test_db().await;
        let found = repo.platform_id(&Platform::new("vinted")).await.unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_parse_stored_decimal_fallback() {
        assert_eq!(
            parse_stored_decimal("gross_sale", "94").to_canonical_string(),
            "94"
        );
        assert!(parse_stored_decimal("gross_sale", "not-a-number").is_zero());
    }
}
