//! Inventory item: a physical unit held for resale.

use crate::domain::{Decimal, ItemStatus, SizeLabel, Sku};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Tolerance for the `gross = net + vat` purchase price invariant.
///
/// Legacy rows were split with float arithmetic, so a one-cent drift is
/// accepted.
const VAT_SPLIT_TOLERANCE: &str = "0.01";

/// A physical unit held for resale.
///
/// Created at purchase ingestion; its status reaches `sold` exactly once,
/// driven by the reconciliation gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Database row id.
    pub id: i64,
    /// Product row id (SKU-level metadata).
    pub product_id: i64,
    /// Manufacturer style code, denormalized for resolution and display.
    pub sku: Sku,
    /// Shoe size label.
    pub size: SizeLabel,
    /// Lifecycle status.
    pub status: ItemStatus,
    /// Purchase price including VAT.
    pub gross_purchase_price: Decimal,
    /// Purchase price excluding VAT.
    pub net_purchase_price: Decimal,
    /// VAT paid at purchase.
    pub vat_amount: Decimal,
    /// VAT rate applied at purchase (e.g., 0.19).
    pub vat_rate: Decimal,
    /// Date the purchase was placed. Legacy rows may lack it.
    pub purchase_date: Option<NaiveDate>,
    /// Date the pair physically arrived.
    pub delivery_date: Option<NaiveDate>,
}

impl InventoryItem {
    /// Check the `gross = net + vat` invariant within the cent tolerance.
    pub fn vat_split_consistent(&self) -> bool {
        let tolerance =
            Decimal::from_str(VAT_SPLIT_TOLERANCE).unwrap_or_else(|_| Decimal::zero());
        let drift = self.gross_purchase_price - (self.net_purchase_price + self.vat_amount);
        !(drift.abs() > tolerance)
    }
}
