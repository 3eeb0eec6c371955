//! AWIN affiliate feed parser.
//!
//! Purchases flow in as CSV transaction exports from the AWIN dashboard.
//! This module parses them into typed purchase records for intake; it
//! never touches the sale side.

use super::SourceError;
use crate::domain::{Decimal, PurchaseRecord, SizeLabel, Sku};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// One row of an AWIN transaction export.
#[derive(Debug, Deserialize)]
struct AwinRow {
    #[serde(rename = "Order Reference")]
    order_reference: String,
    #[serde(rename = "Advertiser")]
    advertiser: String,
    #[serde(rename = "Product Name")]
    product_name: String,
    #[serde(rename = "Brand")]
    brand: String,
    #[serde(rename = "SKU")]
    sku: String,
    #[serde(rename = "Size")]
    size: String,
    #[serde(rename = "Order Value")]
    order_value: String,
    #[serde(rename = "Transaction Date")]
    transaction_date: String,
    #[serde(rename = "Delivery Date", default)]
    delivery_date: Option<String>,
}

/// AWIN CSV feed reader.
#[derive(Debug, Clone)]
pub struct AwinFeed {
    vat_rate: Decimal,
}

impl AwinFeed {
    /// Create a feed reader; AWIN exports carry gross prices, so the VAT
    /// split uses this rate.
    pub fn new(vat_rate: Decimal) -> Self {
        Self { vat_rate }
    }

    /// Parse a feed file from disk.
    ///
    /// # Errors
    /// Returns an error when the file cannot be opened or has no valid
    /// CSV header. Individual malformed rows are skipped with a warning.
    pub fn parse_path(&self, path: &Path) -> Result<Vec<PurchaseRecord>, SourceError> {
        let file = std::fs::File::open(path)
            .map_err(|e| SourceError::Other(format!("open {}: {}", path.display(), e)))?;
        self.parse_reader(file)
    }

    /// Parse a feed from any reader.
    ///
    /// # Errors
    /// Returns an error when the CSV header is unreadable.
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<PurchaseRecord>, SourceError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for (index, result) in csv_reader.deserialize::<AwinRow>().enumerate() {
            let row = match result {
                Ok(row) => row,
                Err(e) => {
                    warn!(row = index + 1, error = %e, "Skipping malformed AWIN row");
                    continue;
                }
            };
            match self.convert_row(row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(row = index + 1, error = %e, "Skipping unusable AWIN row");
                }
            }
        }

        Ok(records)
    }

    fn convert_row(&self, row: AwinRow) -> Result<PurchaseRecord, SourceError> {
        let gross_price = Decimal::from_str(&row.order_value)
            .map_err(|e| SourceError::Parse(format!("Order Value: {}", e)))?;

        let purchase_date = parse_feed_date(&row.transaction_date)?;
        let delivery_date = match row.delivery_date.as_deref() {
            None => None,
            Some(raw) => parse_feed_date(raw)?,
        };

        let external_ref =
            (!row.order_reference.is_empty()).then(|| row.order_reference.clone());

        Ok(PurchaseRecord::new(
            external_ref,
            Sku::new(row.sku),
            row.product_name,
            row.brand,
            SizeLabel::new(row.size),
            row.advertiser,
            gross_price,
            self.vat_rate,
            purchase_date,
            delivery_date,
        ))
    }
}

fn parse_feed_date(raw: &str) -> Result<Option<NaiveDate>, SourceError> {
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::from_str(raw)
        .map(Some)
        .map_err(|e| SourceError::Parse(format!("date {}: {}", raw, e)))
}
