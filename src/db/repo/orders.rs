//! Order lookup, listing, and payout confirmation.

use super::{millis_to_datetime, parse_stored_decimal, Repository};
use crate::domain::{Order, Platform};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

const ORDER_COLUMNS: &str = r#"
    o.id, o.inventory_item_id, p.name AS platform, o.external_id, o.sold_at,
    o.gross_sale, o.platform_fee, o.net_proceeds, o.gross_profit,
    o.net_profit, o.roi_percent, o.shelf_life_days,
    o.payout_received, o.payout_date, o.created_at
"#;

impl Repository {
    /// Fast-path idempotency lookup by the (platform, external_id) key.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_order(
        &self,
        platform: &Platform,
        external_id: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             JOIN platforms p ON p.id = o.platform_id
             WHERE p.name = ? AND o.external_id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(platform.as_str())
            .bind(external_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| map_order_row(&r)))
    }

    /// Fetch one order by row id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_order(&self, id: i64) -> Result<Option<Order>, sqlx::Error> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders o
             JOIN platforms p ON p.id = o.platform_id
             WHERE o.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| map_order_row(&r)))
    }

    /// List orders with optional platform and sold_at window filters,
    /// oldest sale first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_orders(
        &self,
        platform: Option<&Platform>,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let from_ms = from_ms.unwrap_or(0);
        let to_ms = to_ms.unwrap_or(i64::MAX);

        let rows = match platform {
            Some(platform) => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders o
                     JOIN platforms p ON p.id = o.platform_id
                     WHERE p.name = ? AND o.sold_at >= ? AND o.sold_at <= ?
                     ORDER BY o.sold_at ASC, o.id ASC"
                );
                sqlx::query(&sql)
                    .bind(platform.as_str())
                    .bind(from_ms)
                    .bind(to_ms)
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ORDER_COLUMNS} FROM orders o
                     JOIN platforms p ON p.id = o.platform_id
                     WHERE o.sold_at >= ? AND o.sold_at <= ?
                     ORDER BY o.sold_at ASC, o.id ASC"
                );
                sqlx::query(&sql)
                    .bind(from_ms)
                    .bind(to_ms)
                    .fetch_all(self.pool())
                    .await?
            }
        };
        Ok(rows.iter().map(map_order_row).collect())
    }

    /// Record that the marketplace payout landed.
    ///
    /// The payout fields are the only permitted post-creation mutation of
    /// an order. Returns false when the order does not exist.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub async fn mark_payout(
        &self,
        order_id: i64,
        payout_date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET payout_received = 1, payout_date = ? WHERE id = ?",
        )
        .bind(payout_date.to_string())
        .bind(order_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub(super) fn map_order_row(row: &SqliteRow) -> Order {
    Order {
        id: row.get("id"),
        inventory_item_id: row.get("inventory_item_id"),
        platform: Platform::new(row.get::<String, _>("platform")),
        external_id: row.get("external_id"),
        sold_at: millis_to_datetime(row.get("sold_at")),
        gross_sale: parse_stored_decimal("gross_sale", &row.get::<String, _>("gross_sale")),
        platform_fee: parse_stored_decimal(
            "platform_fee",
            &row.get::<String, _>("platform_fee"),
        ),
        net_proceeds: parse_stored_decimal(
            "net_proceeds",
            &row.get::<String, _>("net_proceeds"),
        ),
        gross_profit: parse_stored_decimal(
            "gross_profit",
            &row.get::<String, _>("gross_profit"),
        ),
        net_profit: parse_stored_decimal("net_profit", &row.get::<String, _>("net_profit")),
        roi_percent: row
            .get::<Option<String>, _>("roi_percent")
            .map(|s| parse_stored_decimal("roi_percent", &s)),
        shelf_life_days: row.get("shelf_life_days"),
        payout_received: row.get::<i64, _>("payout_received") != 0,
        payout_date: row.get::<Option<String>, _>("payout_date").and_then(|s| {
            NaiveDate::from_str(&s)
                .map_err(|e| {
                    warn!(value = %s, error = %e, "Failed to parse payout date, dropping it");
                    e
                })
                .ok()
        }),
        created_at: millis_to_datetime(row.get("created_at")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::init_db;
    use crate::db::repo::OrderPersistOutcome;
    use crate::domain::{
        Decimal, OrderDraft, PlatformFeeSchedule, PurchaseRecord, SizeLabel, Sku,
    };
    use chrono::{TimeZone, Utc};
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

    async fn seed_item(repo: &Repository, external_ref: &str) -> i64 {
        let rec = PurchaseRecord::new(
            Some(external_ref.to_string()),
            Sku::new("ASICS-GK20"),
            "Asics Gel-Kayano 20".to_string(),
            "Asics".to_string(),
            SizeLabel::new("EU38"),
            "awin:asics".to_string(),
            Decimal::from_str("88.23").unwrap(),
            Decimal::from_str("0.19").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1),
            None,
        );
        let product_id = repo
            .upsert_product(&rec.sku, &rec.product_name, &rec.brand)
            .await
            .unwrap();
        repo.insert_inventory_item(
            product_id,
            &rec,
            Decimal::from_str("74.14").unwrap(),
            Decimal::from_str("14.09").unwrap(),
        )
        .await
        .unwrap()
        .unwrap()
    }

    async fn seed_platform(repo: &Repository) {
        repo.upsert_platform(&PlatformFeeSchedule::new(
            Platform::new("stockx"),
            Decimal::from_str("0.095").unwrap(),
            Decimal::from_str("1.5").unwrap(),
            "EUR",
        ))
        .await
        .unwrap();
    }

    fn draft(item_id: i64, external_id: &str) -> OrderDraft {
        OrderDraft {
            inventory_item_id: item_id,
            platform: Platform::new("stockx"),
            external_id: external_id.to_string(),
            sold_at: Utc.with_ymd_and_hms(2025, 1, 11, 9, 30, 0).unwrap(),
            gross_sale: Decimal::from_str("94").unwrap(),
            platform_fee: Decimal::from_str("10.43").unwrap(),
            net_proceeds: Decimal::from_str("83.57").unwrap(),
            gross_profit: Decimal::from_str("5.77").unwrap(),
            net_profit: Decimal::from_str("-4.66").unwrap(),
            roi_percent: Some(Decimal::from_str("-5.28").unwrap()),
            shelf_life_days: Some(10),
            source_payload: serde_json::json!({"orderNumber": external_id}),
        }
    }

    #[tokio::test]
    async fn test_create_then_find_order() {
        let (repo, _temp) = setup_test_db().await;
        seed_platform(&repo).await;
        let item_id = seed_item(&repo, "AW-1").await;

        let outcome = repo.create_order_atomic(&draft(item_id, "SX-123")).await.unwrap();
        let order = match outcome {
            OrderPersistOutcome::Created(order) => order,
            other => panic!("expected Created, got {:?}", other),
        };

        let found = repo
            .find_order(&Platform::new("stockx"), "SX-123")
            .await
            .unwrap()
            .expect("order should exist");
        assert_eq!(found.id, order.id);
        assert_eq!(found.net_profit.to_canonical_string(), "-4.66");
        assert_eq!(found.roi_percent.unwrap().to_canonical_string(), "-5.28");
        assert_eq!(found.shelf_life_days, Some(10));
        assert!(!found.payout_received);

        // The sold item is gone from stock.
        let item = repo.get_item(item_id).await.unwrap().unwrap();
        assert_eq!(item.status, crate::domain::ItemStatus::Sold);
    }

    #[tokio::test]
    async fn test_duplicate_external_id_inserts_nothing() {
        let (repo, _temp) = setup_test_db().await;
        seed_platform(&repo).await;
        let first_item = seed_item(&repo, "AW-1").await;
        let second_item = seed_item(&repo, "AW-2").await;

        let first = repo
            .create_order_atomic(&draft(first_item, "SX-123"))
            .await
            .unwrap();
        assert!(matches!(first, OrderPersistOutcome::Created(_)));

        // Same external id against a different item: the unique index wins.
        let second = repo
            .create_order_atomic(&draft(second_item, "SX-123"))
            .await
            .unwrap();
        assert_eq!(second, OrderPersistOutcome::DuplicateExternalId);

        let orders = repo.list_orders(None, None, None).await.unwrap();
        assert_eq!(orders.len(), 1);

        // The second item is untouched.
        let item = repo.get_item(second_item).await.unwrap().unwrap();
        assert_eq!(item.status, crate::domain::ItemStatus::InStock);
    }

    #[tokio::test]
    async fn test_lost_item_race_rolls_back_order() {
        let (repo, _temp) = setup_test_db().await;
        seed_platform(&repo).await;
        let item_id = seed_item(&repo, "AW-1").await;

        // The item gets sold out from under the draft.
        sqlx::query("UPDATE inventory_items SET status = 'sold' WHERE id = ?")
            .bind(item_id)
            .execute(repo.pool())
            .await
            .unwrap();

        let outcome = repo
            .create_order_atomic(&draft(item_id, "SX-999"))
            .await
            .unwrap();
        assert_eq!(outcome, OrderPersistOutcome::ItemUnavailable);

        // The order insert rolled back with the transaction.
        let found = repo
            .find_order(&Platform::new("stockx"), "SX-999")
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_window_filter() {
        let (repo, _temp) = setup_test_db().await;
        seed_platform(&repo).await;
        let item_id = seed_item(&repo, "AW-1").await;
        repo.create_order_atomic(&draft(item_id, "SX-123"))
            .await
            .unwrap();

        let sold_at_ms = Utc
            .with_ymd_and_hms(2025, 1, 11, 9, 30, 0)
            .unwrap()
            .timestamp_millis();

        let hit = repo
            .list_orders(Some(&Platform::new("stockx")), Some(sold_at_ms - 1), None)
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = repo
            .list_orders(None, Some(sold_at_ms + 1), None)
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn test_mark_payout() {
        let (repo, _temp) = setup_test_db().await;
        seed_platform(&repo).await;
        let item_id = seed_item(&repo, "AW-1").await;
        let outcome = repo
            .create_order_atomic(&draft(item_id, "SX-123"))
            .await
            .unwrap();
        let order = match outcome {
            OrderPersistOutcome::Created(order) => order,
            other => panic!("expected Created, got {:?}", other),
        };

        let payout_date = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        assert!(repo.mark_payout(order.id, payout_date).await.unwrap());

        let updated = repo.get_order(order.id).await.unwrap().unwrap();
        assert!(updated.payout_received);
        assert_eq!(updated.payout_date, Some(payout_date));

        assert!(!repo.mark_payout(9999, payout_date).await.unwrap());
    }
}
