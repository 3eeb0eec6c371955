//! Purchase intake: turns supplier purchase records into inventory items.

use crate::db::Repository;
use crate::domain::{Decimal, PurchaseRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Summary of one intake run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakeReport {
    pub created: usize,
    pub skipped_duplicate: usize,
    pub rejected_invalid: usize,
}

/// Ingests purchase records idempotently.
///
/// Each record upserts its product by SKU and inserts one inventory item
/// keyed on the record's intake key; replays of the same feed insert
/// nothing new.
#[derive(Clone)]
pub struct Intake {
    repo: Arc<Repository>,
}

impl Intake {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Ingest a batch of purchase records, recovering per record.
    pub async fn ingest(&self, records: &[PurchaseRecord]) -> IntakeReport {
        let mut report = IntakeReport::default();

        for record in records {
            if let Some(reason) = validation_failure(record) {
                warn!(
                    intake_key = %record.intake_key,
                    reason = reason,
                    "Purchase record rejected"
                );
                report.rejected_invalid += 1;
                continue;
            }

            match self.ingest_one(record).await {
                Ok(Some(item_id)) => {
                    info!(
                        intake_key = %record.intake_key,
                        item_id = item_id,
                        sku = %record.sku,
                        size = %record.size,
                        "Inventory item created"
                    );
                    report.created += 1;
                }
                Ok(None) => {
                    info!(intake_key = %record.intake_key, "Purchase already ingested, skipping");
                    report.skipped_duplicate += 1;
                }
                Err(e) => {
                    error!(
                        intake_key = %record.intake_key,
                        error = %e,
                        "Storage failure while ingesting purchase, continuing"
                    );
                    report.rejected_invalid += 1;
                }
            }
        }

        info!(
            created = report.created,
            skipped_duplicate = report.skipped_duplicate,
            rejected_invalid = report.rejected_invalid,
            "Purchase intake finished"
        );
        report
    }

    async fn ingest_one(&self, record: &PurchaseRecord) -> Result<Option<i64>, sqlx::Error> {
        let product_id = self
            .repo
            .upsert_product(&record.sku, &record.product_name, &record.brand)
            .await?;
        let (net, vat) = split_vat(record.gross_price, record.vat_rate);
        self.repo
            .insert_inventory_item(product_id, record, net, vat)
            .await
    }
}

/// Split a gross purchase price into net and VAT at the given rate.
///
/// The net is rounded half-even to cents and the VAT is the exact
/// complement, so `gross = net + vat` holds to the cent by construction.
pub fn split_vat(gross: Decimal, vat_rate: Decimal) -> (Decimal, Decimal) {
    if vat_rate.is_zero() || vat_rate.is_negative() {
        return (gross, Decimal::zero());
    }
    let net = (gross / (Decimal::one() + vat_rate)).round_money();
    let vat = gross - net;
    (net, vat)
}

fn validation_failure(record: &PurchaseRecord) -> Option<&'static str> {
    if record.sku.is_empty() {
        return Some("sku is empty");
    }
    if record.size.is_empty() {
        return Some("size is empty");
    }
    if record.gross_price.is_negative() {
        return Some("gross price is negative");
    }
    if record.gross_price.is_zero() {
        // Zero-cost pairs (promos, giveaways) are allowed; ROI stays
        // undefined for them downstream.
        warn!(intake_key = %record.intake_key, "Zero gross purchase price");
    }
    None
}
