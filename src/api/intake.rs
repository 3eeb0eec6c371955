use axum::extract::State;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

use super::AppState;
use crate::domain::{Decimal, PurchaseRecord, SizeLabel, Sku};
use crate::error::AppError;
use crate::reconcile::IntakeReport;

/// Manual purchase entry, one bought pair per row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRow {
    pub external_ref: Option<String>,
    pub sku: String,
    pub product_name: String,
    pub brand: String,
    pub size: String,
    pub supplier: Option<String>,
    pub gross_price: String,
    pub vat_rate: Option<String>,
    pub purchase_date: Option<String>,
    pub delivery_date: Option<String>,
}

pub async fn post_purchases(
    State(state): State<AppState>,
    Json(rows): Json<Vec<PurchaseRow>>,
) -> Result<Json<IntakeReport>, AppError> {
    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        records.push(convert_row(&state, index, row)?);
    }

    let report = state.intake.ingest(&records).await;
    Ok(Json(report))
}

fn convert_row(
    state: &AppState,
    index: usize,
    row: PurchaseRow,
) -> Result<PurchaseRecord, AppError> {
    let gross_price = Decimal::from_str(row.gross_price.trim())
        .map_err(|_| AppError::BadRequest(format!("row {}: grossPrice is not a number", index)))?;

    let vat_rate = match row.vat_rate.as_deref().map(str::trim) {
        None | Some("") => state.config.default_vat_rate,
        Some(raw) => Decimal::from_str(raw)
            .map_err(|_| AppError::BadRequest(format!("row {}: vatRate is not a number", index)))?,
    };

    let purchase_date = parse_date(&row.purchase_date, index, "purchaseDate")?;
    let delivery_date = parse_date(&row.delivery_date, index, "deliveryDate")?;

    Ok(PurchaseRecord::new(
        row.external_ref,
        Sku::new(row.sku),
        row.product_name,
        row.brand,
        SizeLabel::new(row.size),
        row.supplier.unwrap_or_else(|| "manual".to_string()),
        gross_price,
        vat_rate,
        purchase_date,
        delivery_date,
    ))
}

fn parse_date(
    raw: &Option<String>,
    index: usize,
    field: &str,
) -> Result<Option<NaiveDate>, AppError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => NaiveDate::from_str(text).map(Some).map_err(|_| {
            AppError::BadRequest(format!("row {}: {} must be YYYY-MM-DD", index, field))
        }),
    }
}
