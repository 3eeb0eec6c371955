//! Purchase record: one bought pair arriving from a supplier feed.

use crate::domain::{Decimal, SizeLabel, Sku};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A purchase-side record from an AWIN feed, a supplier export, or manual
/// entry. Consumed by intake, which turns it into an inventory item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    /// Stable unique identifier for this purchase.
    ///
    /// Priority: supplier order reference (if present) > hash of
    /// deterministic fields.
    pub intake_key: String,
    /// Supplier order reference when the feed carried one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_ref: Option<String>,
    /// Manufacturer style code.
    pub sku: Sku,
    /// Product display name.
    pub product_name: String,
    /// Brand as stated by the supplier. Data, never derived.
    pub brand: String,
    /// Shoe size label.
    pub size: SizeLabel,
    /// Retailer/supplier the pair was bought from.
    pub supplier: String,
    /// Purchase price including VAT.
    pub gross_price: Decimal,
    /// VAT rate applied at purchase (e.g., 0.19).
    pub vat_rate: Decimal,
    /// Date the purchase was placed.
    pub purchase_date: Option<NaiveDate>,
    /// Date the pair arrived.
    pub delivery_date: Option<NaiveDate>,
}

impl PurchaseRecord {
    /// Create a record and compute its `intake_key`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        external_ref: Option<String>,
        sku: Sku,
        product_name: String,
        brand: String,
        size: SizeLabel,
        supplier: String,
        gross_price: Decimal,
        vat_rate: Decimal,
        purchase_date: Option<NaiveDate>,
        delivery_date: Option<NaiveDate>,
    ) -> Self {
        let external_ref = external_ref
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        let intake_key = Self::compute_intake_key(
            external_ref.as_deref(),
            &sku,
            &size,
            &gross_price,
            purchase_date,
        );
        Self {
            intake_key,
            external_ref,
            sku,
            product_name,
            brand,
            size,
            supplier,
            gross_price,
            vat_rate,
            purchase_date,
            delivery_date,
        }
    }

    /// Compute a stable unique key for this purchase.
    ///
    /// Priority: supplier order reference (if present) > truncated SHA-256
    /// over (sku, size, purchase_date, gross_price). 128 hash bits give far
    /// more collision headroom than any plausible purchase volume needs.
    pub fn compute_intake_key(
        external_ref: Option<&str>,
        sku: &Sku,
        size: &SizeLabel,
        gross_price: &Decimal,
        purchase_date: Option<NaiveDate>,
    ) -> String {
        if let Some(r) = external_ref.filter(|s| !s.trim().is_empty()) {
            return format!("ref:{}", r.trim());
        }

        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(sku.as_str());
        hasher.update([0u8]);
        hasher.update(size.as_str());
        hasher.update([0u8]);
        hasher.update(gross_price.to_canonical_string());
        hasher.update([0u8]);
        if let Some(date) = purchase_date {
            hasher.update(date.to_string());
        }
        let hash = hasher.finalize();
        format!("hash:{}", hex::encode(&hash[..16]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn record(external_ref: Option<&str>) -> PurchaseRecord {
        PurchaseRecord::new(
            external_ref.map(String::from),
            Sku::new("ASICS-GK20"),
            "Asics Gel-Kayano 20".to_string(),
            "Asics".to_string(),
            SizeLabel::new("EU38"),
            "awin:asics".to_string(),
            Decimal::from_str("88.23").unwrap(),
            Decimal::from_str("0.19").unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 1),
            None,
        )
    }

    #[test]
    fn test_intake_key_prefers_external_ref() {
        assert_eq!(record(Some("AW-778899")).intake_key, "ref:AW-778899");
    }

    #[test]
    fn test_blank_external_ref_falls_back_to_hash() {
        let rec = record(Some("   "));
        assert!(rec.external_ref.is_none());
        assert!(rec.intake_key.starts_with("hash:"));
        assert_eq!(rec.intake_key.len(), 5 + 32);
    }

    #[test]
    fn test_intake_key_deterministic() {
        assert_eq!(record(None).intake_key, record(None).intake_key);
    }

    #[test]
    fn test_intake_key_sensitive_to_fields() {
        let base = record(None);
        let mut other = record(None);
        other = PurchaseRecord::new(
            None,
            other.sku,
            other.product_name,
            other.brand,
            SizeLabel::new("EU39"),
            other.supplier,
            other.gross_price,
            other.vat_rate,
            other.purchase_date,
            other.delivery_date,
        );
        assert_ne!(base.intake_key, other.intake_key);
    }

    #[test]
    fn test_field_separator_prevents_boundary_collisions() {
        let a = PurchaseRecord::compute_intake_key(
            None,
            &Sku::new("AB"),
            &SizeLabel::new("C"),
            &Decimal::from_str("1").unwrap(),
            None,
        );
        let b = PurchaseRecord::compute_intake_key(
            None,
            &Sku::new("A"),
            &SizeLabel::new("BC"),
            &Decimal::from_str("1").unwrap(),
            None,
        );
        assert_ne!(a, b);
    }
}
