//! Profitability and brand aggregates.
//!
//! All sums run in Rust over the canonical decimal strings. SQLite's SUM
//! aggregate returns REAL (float) and would drift at cent level across
//! thousands of orders.

use super::{parse_stored_decimal, Repository};
use crate::domain::Decimal;
use sqlx::Row;
use std::collections::BTreeMap;

/// Aggregate profitability over a sold_at window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitSummary {
    pub orders: i64,
    pub gross_revenue: Decimal,
    pub total_fees: Decimal,
    pub total_net_profit: Decimal,
    /// Mean ROI over orders with a defined ROI. None when no order has one.
    pub avg_roi_percent: Option<Decimal>,
    /// Mean days held over orders with a known shelf life.
    pub avg_shelf_life_days: Option<Decimal>,
}

/// Per-brand slice of the same aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrandStats {
    pub brand: String,
    pub orders: i64,
    pub gross_revenue: Decimal,
    pub total_net_profit: Decimal,
    pub avg_roi_percent: Option<Decimal>,
}

/// Current stock position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub in_stock: i64,
    pub listed: i64,
    pub sold: i64,
    pub returned: i64,
    /// Sum of gross purchase prices of unsold stock (in_stock + listed).
    pub capital_tied_up: Decimal,
}

#[derive(Default)]
struct Accumulator {
    orders: i64,
    gross_revenue: Decimal,
    total_fees: Decimal,
    total_net_profit: Decimal,
    roi_sum: Decimal,
    roi_count: i64,
    shelf_sum: i64,
    shelf_count: i64,
}

impl Accumulator {
    fn push(
        &mut self,
        gross_sale: Decimal,
        platform_fee: Decimal,
        net_profit: Decimal,
        roi: Option<Decimal>,
        shelf_life_days: Option<i64>,
    ) {
        self.orders += 1;
        self.gross_revenue = self.gross_revenue + gross_sale;
        self.total_fees = self.total_fees + platform_fee;
        self.total_net_profit = self.total_net_profit + net_profit;
        if let Some(roi) = roi {
            self.roi_sum = self.roi_sum + roi;
            self.roi_count += 1;
        }
        if let Some(days) = shelf_life_days {
            self.shelf_sum += days;
            self.shelf_count += 1;
        }
    }

    fn avg_roi(&self) -> Option<Decimal> {
        (self.roi_count > 0)
            .then(|| (self.roi_sum / Decimal::from(self.roi_count)).round_money())
    }

    fn avg_shelf_life(&self) -> Option<Decimal> {
        (self.shelf_count > 0).then(|| {
            (Decimal::from(self.shelf_sum) / Decimal::from(self.shelf_count)).round_money()
        })
    }
}

impl Repository {
    /// Aggregate profitability over orders sold inside the window.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn profit_summary(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<ProfitSummary, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT gross_sale, platform_fee, net_profit, roi_percent, shelf_life_days
            FROM orders
            WHERE sold_at >= ? AND sold_at <= ?
            ORDER BY sold_at ASC, id ASC
            "#,
        )
        .bind(from_ms.unwrap_or(0))
        .bind(to_ms.unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await?;

        let mut acc = Accumulator::default();
        for row in rows {
            acc.push(
                parse_stored_decimal("gross_sale", &row.get::<String, _>("gross_sale")),
                parse_stored_decimal("platform_fee", &row.get::<String, _>("platform_fee")),
                parse_stored_decimal("net_profit", &row.get::<String, _>("net_profit")),
                row.get::<Option<String>, _>("roi_percent")
                    .map(|s| parse_stored_decimal("roi_percent", &s)),
                row.get("shelf_life_days"),
            );
        }

        Ok(ProfitSummary {
            orders: acc.orders,
            gross_revenue: acc.gross_revenue,
            total_fees: acc.total_fees,
            total_net_profit: acc.total_net_profit,
            avg_roi_percent: acc.avg_roi(),
            avg_shelf_life_days: acc.avg_shelf_life(),
        })
    }

    /// Aggregate profitability per brand over the window, brands sorted
    /// alphabetically.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn brand_breakdown(
        &self,
        from_ms: Option<i64>,
        to_ms: Option<i64>,
    ) -> Result<Vec<BrandStats>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT pr.brand, o.gross_sale, o.platform_fee, o.net_profit, o.roi_percent
            FROM orders o
            JOIN inventory_items i ON i.id = o.inventory_item_id
            JOIN products pr ON pr.id = i.product_id
            WHERE o.sold_at >= ? AND o.sold_at <= ?
            ORDER BY o.sold_at ASC, o.id ASC
            "#,
        )
        .bind(from_ms.unwrap_or(0))
        .bind(to_ms.unwrap_or(i64::MAX))
        .fetch_all(self.pool())
        .await?;

        let mut by_brand: BTreeMap<String, Accumulator> = BTreeMap::new();
        for row in rows {
            let brand: String = row.get("brand");
            by_brand.entry(brand).or_default().push(
                parse_stored_decimal("gross_sale", &row.get::<String, _>("gross_sale")),
                parse_stored_decimal("platform_fee", &row.get::<String, _>("platform_fee")),
                parse_stored_decimal("net_profit", &row.get::<String, _>("net_profit")),
                row.get::<Option<String>, _>("roi_percent")
                    .map(|s| parse_stored_decimal("roi_percent", &s)),
                None,
            );
        }

        Ok(by_brand
            .into_iter()
            .map(|(brand, acc)| BrandStats {
                brand,
                orders: acc.orders,
                gross_revenue: acc.gross_revenue,
                total_net_profit: acc.total_net_profit,
                avg_roi_percent: acc.avg_roi(),
            })
            .collect())
    }

    /// Count items per status and sum the capital sitting in unsold stock.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn inventory_snapshot(&self) -> Result<InventorySnapshot, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT status, gross_purchase_price FROM inventory_items ORDER BY id ASC",
        )
        .fetch_all(self.pool())
        .await?;

        let mut snapshot = InventorySnapshot {
            in_stock: 0,
            listed: 0,
            sold: 0,
            returned: 0,
            capital_tied_up: Decimal::zero(),
        };

        for row in rows {
            let status: String = row.get("status");
            let gross = parse_stored_decimal(
                "gross_purchase_price",
                &row.get::<String, _>("gross_purchase_price"),
            );
            match status.as_str() {
                "in_stock" => {
                    snapshot.in_stock += 1;
                    snapshot.capital_tied_up = snapshot.capital_tied_up + gross;
                }
                "listed" => {
                    snapshot.listed += 1;
                    snapshot.capital_tied_up = snapshot.capital_tied_up + gross;
                }
                "sold" => snapshot.sold += 1,
                _ => snapshot.returned += 1,
            }
        }

        Ok(snapshot)
    }
}
