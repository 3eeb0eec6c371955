//! Order: the durable, reconciled sale record.

use crate::domain::{Decimal, Platform};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A reconciled sale.
///
/// Created exactly once per successfully reconciled candidate and immutable
/// afterwards, except for the payout confirmation fields. `(platform,
/// external_id)` is the dedup key and is UNIQUE at the storage layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Database row id.
    pub id: i64,
    /// The inventory unit this order sold. One item, one terminal sale.
    pub inventory_item_id: i64,
    /// Marketplace the sale happened on.
    pub platform: Platform,
    /// Source-specific sale identifier, unique per platform.
    pub external_id: String,
    /// When the sale completed.
    pub sold_at: DateTime<Utc>,
    /// Sale price before fees.
    pub gross_sale: Decimal,
    /// Total platform fee withheld.
    pub platform_fee: Decimal,
    /// gross_sale − platform_fee.
    pub net_proceeds: Decimal,
    /// gross_sale − gross purchase price.
    pub gross_profit: Decimal,
    /// net_proceeds − gross purchase price.
    pub net_profit: Decimal,
    /// net_profit / gross purchase price × 100. None when the purchase
    /// price was zero and the store-null policy applied.
    pub roi_percent: Option<Decimal>,
    /// Days between purchase and sale. None for legacy items without a
    /// purchase date.
    pub shelf_life_days: Option<i64>,
    /// Whether the marketplace payout has landed.
    pub payout_received: bool,
    /// Date the payout landed.
    pub payout_date: Option<NaiveDate>,
    /// When the order row was created.
    pub created_at: DateTime<Utc>,
}

/// The computed fields of an order before it has a row id.
///
/// The reconciliation gate builds one of these and hands it to the
/// repository, which assigns the id inside the insert transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDraft {
    pub inventory_item_id: i64,
    pub platform: Platform,
    pub external_id: String,
    pub sold_at: DateTime<Utc>,
    pub gross_sale: Decimal,
    pub platform_fee: Decimal,
    pub net_proceeds: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    pub roi_percent: Option<Decimal>,
    pub shelf_life_days: Option<i64>,
    pub source_payload: serde_json::Value,
}
