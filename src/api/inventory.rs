use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::domain::{InventoryItem, ItemStatus};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryQuery {
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryResponse {
    pub items: Vec<ItemDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDto {
    pub id: i64,
    pub sku: String,
    pub size: String,
    pub status: String,
    pub gross_purchase_price: String,
    pub net_purchase_price: String,
    pub vat_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_date: Option<String>,
}

impl From<&InventoryItem> for ItemDto {
    fn from(item: &InventoryItem) -> Self {
        ItemDto {
            id: item.id,
            sku: item.sku.as_str().to_string(),
            size: item.size.as_str().to_string(),
            status: item.status.to_string(),
            gross_purchase_price: item.gross_purchase_price.to_canonical_string(),
            net_purchase_price: item.net_purchase_price.to_canonical_string(),
            vat_amount: item.vat_amount.to_canonical_string(),
            purchase_date: item.purchase_date.map(|d| d.to_string()),
            delivery_date: item.delivery_date.map(|d| d.to_string()),
        }
    }
}

pub async fn get_inventory(
    Query(params): Query<InventoryQuery>,
    State(state): State<AppState>,
) -> Result<Json<InventoryResponse>, AppError> {
    let status = match params.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(ItemStatus::parse(raw).ok_or_else(|| {
            AppError::BadRequest(format!("Unknown item status: {}", raw))
        })?),
    };

    let items = state.repo.list_items(status).await?;
    Ok(Json(InventoryResponse {
        items: items.iter().map(ItemDto::from).collect(),
    }))
}
