//! Product and inventory item operations.

use super::{parse_stored_decimal, Repository};
use crate::domain::{
    Decimal, InventoryItem, ItemStatus, PurchaseRecord, SizeLabel, Sku,
};
use chrono::{NaiveDate, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

const ITEM_COLUMNS: &str = r#"
    i.id, i.product_id, p.sku, i.size, i.status,
    i.gross_purchase_price, i.net_purchase_price, i.vat_amount, i.vat_rate,
    i.purchase_date, i.delivery_date
"#;

impl Repository {
    /// Insert or refresh a product row by unique SKU, returning its id.
    ///
    /// Name and brand come from the typed intake record; later feeds win.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub async fn upsert_product(
        &self,
        sku: &Sku,
        name: &str,
        brand: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (sku, name, brand, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(sku) DO UPDATE SET
                name = excluded.name,
                brand = excluded.brand
            "#,
        )
        .bind(sku.as_str())
        .bind(name)
        .bind(brand)
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool())
        .await?;

        let row = sqlx::query("SELECT id FROM products WHERE sku = ?")
            .bind(sku.as_str())
            .fetch_one(self.pool())
            .await?;
        Ok(row.get("id"))
    }

    /// Insert an inventory item idempotently on its intake key.
    ///
    /// Returns the new row id, or None when the key already exists.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_inventory_item(
        &self,
        product_id: i64,
        record: &PurchaseRecord,
        net_price: Decimal,
        vat_amount: Decimal,
    ) -> Result<Option<i64>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO inventory_items (
                product_id, intake_key, supplier, size, status,
                gross_purchase_price, net_purchase_price, vat_amount, vat_rate,
                purchase_date, delivery_date, created_at
            ) VALUES (?, ?, ?, ?, 'in_stock', ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(intake_key) DO NOTHING
            "#,
        )
        .bind(product_id)
        .bind(&record.intake_key)
        .bind(&record.supplier)
        .bind(record.size.as_str())
        .bind(record.gross_price.to_canonical_string())
        .bind(net_price.to_canonical_string())
        .bind(vat_amount.to_canonical_string())
        .bind(record.vat_rate.to_canonical_string())
        .bind(record.purchase_date.map(|d| d.to_string()))
        .bind(record.delivery_date.map(|d| d.to_string()))
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool())
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    /// Fetch one item by row id.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn get_item(&self, id: i64) -> Result<Option<InventoryItem>, sqlx::Error> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items i
             JOIN products p ON p.id = i.product_id
             WHERE i.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|r| map_item_row(&r)))
    }

    /// Resolve in-stock items by exact SKU and size.
    ///
    /// Callers must treat anything other than exactly one match as a
    /// resolution failure; this method never guesses.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn find_in_stock_by_sku_size(
        &self,
        sku: &Sku,
        size: &SizeLabel,
    ) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM inventory_items i
             JOIN products p ON p.id = i.product_id
             WHERE p.sku = ? AND i.size = ? AND i.status = 'in_stock'
             ORDER BY i.id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(sku.as_str())
            .bind(size.as_str())
            .fetch_all(self.pool())
            .await?;
        Ok(rows.iter().map(map_item_row).collect())
    }

    /// List items, optionally filtered by status, oldest first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_items(
        &self,
        status: Option<ItemStatus>,
    ) -> Result<Vec<InventoryItem>, sqlx::Error> {
        let rows = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM inventory_items i
                     JOIN products p ON p.id = i.product_id
                     WHERE i.status = ?
                     ORDER BY i.id ASC"
                );
                sqlx::query(&sql)
                    .bind(status.as_str())
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {ITEM_COLUMNS} FROM inventory_items i
                     JOIN products p ON p.id = i.product_id
                     ORDER BY i.id ASC"
                );
                sqlx::query(&sql).fetch_all(self.pool()).await?
            }
        };
        Ok(rows.iter().map(map_item_row).collect())
    }
}

fn map_item_row(row: &SqliteRow) -> InventoryItem {
    let status_str: String = row.get("status");
    let status = ItemStatus::parse(&status_str).unwrap_or_else(|| {
        warn!(status = %status_str, "Unknown item status in database, treating as returned");
        ItemStatus::Returned
    });

    InventoryItem {
        id: row.get("id"),
        product_id: row.get("product_id"),
        sku: Sku::new(row.get::<String, _>("sku")),
        size: SizeLabel::new(row.get::<String, _>("size")),
        status,
        gross_purchase_price: parse_stored_decimal(
            "gross_purchase_price",
            &row.get::<String, _>("gross_purchase_price"),
        ),
        net_purchase_price: parse_stored_decimal(
            "net_purchase_price",
            &row.get::<String, _>("net_purchase_price"),
        ),
        vat_amount: parse_stored_decimal("vat_amount", &row.get::<String, _>("vat_amount")),
        vat_rate: parse_stored_decimal("vat_rate", &row.get::<String, _>("vat_rate")),
        purchase_date: parse_stored_date(row.get::<Option<String>, _>("purchase_date")),
        delivery_date: parse_stored_date(row.get::<Option<String>, _>("delivery_date")),
    }
}

fn parse_stored_date(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|s| {
        NaiveDate::from_str(&s)
            .map_err(|e| {
                warn!(value = %s, error = %e, "Failed to parse stored date, dropping it");
                e
            })
            .ok()
    })
}
