use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::AppState;
use crate::domain::{Order, Platform};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersQuery {
    pub platform: Option<String>,
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrdersResponse {
    pub orders: Vec<OrderDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDto {
    pub id: i64,
    pub inventory_item_id: i64,
    pub platform: String,
    pub external_id: String,
    pub sold_at_ms: i64,
    pub gross_sale: String,
    pub platform_fee: String,
    pub net_proceeds: String,
    pub gross_profit: String,
    pub net_profit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi_percent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shelf_life_days: Option<i64>,
    pub payout_received: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_date: Option<String>,
}

impl From<&Order> for OrderDto {
    fn from(order: &Order) -> Self {
        OrderDto {
            id: order.id,
            inventory_item_id: order.inventory_item_id,
            platform: order.platform.as_str().to_string(),
            external_id: order.external_id.clone(),
            sold_at_ms: order.sold_at.timestamp_millis(),
            gross_sale: order.gross_sale.to_canonical_string(),
            platform_fee: order.platform_fee.to_canonical_string(),
            net_proceeds: order.net_proceeds.to_canonical_string(),
            gross_profit: order.gross_profit.to_canonical_string(),
            net_profit: order.net_profit.to_canonical_string(),
            roi_percent: order.roi_percent.map(|r| r.to_canonical_string()),
            shelf_life_days: order.shelf_life_days,
            payout_received: order.payout_received,
            payout_date: order.payout_date.map(|d| d.to_string()),
        }
    }
}

pub async fn get_orders(
    Query(params): Query<OrdersQuery>,
    State(state): State<AppState>,
) -> Result<Json<OrdersResponse>, AppError> {
    let platform = match params.platform.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(Platform::new(name)),
    };

    let orders = state
        .repo
        .list_orders(platform.as_ref(), params.from_ms, params.to_ms)
        .await?;

    Ok(Json(OrdersResponse {
        orders: orders.iter().map(OrderDto::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutRequest {
    pub payout_date: String,
}

pub async fn post_payout(
    Path(order_id): Path<i64>,
    State(state): State<AppState>,
    Json(body): Json<PayoutRequest>,
) -> Result<Json<OrderDto>, AppError> {
    let payout_date = NaiveDate::from_str(body.payout_date.trim())
        .map_err(|_| AppError::BadRequest("payoutDate must be YYYY-MM-DD".to_string()))?;

    let updated = state.repo.mark_payout(order_id, payout_date).await?;
    if !updated {
        return Err(AppError::NotFound(format!("order {}", order_id)));
    }

    let order = state
        .repo
        .get_order(order_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {}", order_id)))?;
    Ok(Json(OrderDto::from(&order)))
}
