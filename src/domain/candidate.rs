//! Sale candidate: an unvalidated sale record arriving from any source.

use crate::domain::{Decimal, Platform, SizeLabel, Sku};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleOrigin {
    /// StockX selling API.
    Stockx,
    /// Notion bookkeeping database export.
    Notion,
    /// Hand-entered record.
    Manual,
}

impl std::fmt::Display for SaleOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaleOrigin::Stockx => write!(f, "stockx"),
            SaleOrigin::Notion => write!(f, "notion"),
            SaleOrigin::Manual => write!(f, "manual"),
        }
    }
}

/// Reference to the inventory unit a sale claims to have sold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemRef {
    /// Direct inventory row id (manual entry).
    ItemId(i64),
    /// SKU plus size, the shape marketplace notifications arrive in.
    SkuSize { sku: Sku, size: SizeLabel },
}

impl ItemRef {
    /// Returns true when the reference carries no usable key.
    pub fn is_empty(&self) -> bool {
        match self {
            ItemRef::ItemId(_) => false,
            ItemRef::SkuSize { sku, size } => sku.is_empty() || size.is_empty(),
        }
    }
}

impl std::fmt::Display for ItemRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemRef::ItemId(id) => write!(f, "item:{}", id),
            ItemRef::SkuSize { sku, size } => write!(f, "{} {}", sku, size),
        }
    }
}

/// An unvalidated sale record from an external source.
///
/// Consumed by the reconciliation gate and either promoted to an Order or
/// discarded; never persisted directly. The raw source payload rides along
/// for audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCandidate {
    /// Source-specific sale identifier; half of the idempotency key.
    pub external_sale_id: String,
    /// Marketplace the sale happened on; the other half of the key.
    pub platform: Platform,
    /// Which inventory unit the sale claims.
    pub item_ref: ItemRef,
    /// Sale price before fees.
    pub sale_price: Decimal,
    /// When the sale completed.
    pub sold_at: DateTime<Utc>,
    /// Where the record came from.
    pub origin: SaleOrigin,
    /// Raw upstream record, retained for audit.
    pub source_payload: serde_json::Value,
}

impl SaleCandidate {
    /// Field names that are missing or empty, in declaration order.
    ///
    /// A non-empty result means the candidate cannot enter reconciliation.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.external_sale_id.trim().is_empty() {
            missing.push("external_sale_id");
        }
        if self.platform.is_empty() {
            missing.push("platform_name");
        }
        if !self.sale_price.is_positive() {
            missing.push("sale_price");
        }
        if self.item_ref.is_empty() {
            missing.push("inventory_reference");
        }
        missing
    }
}
