use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::AppState;
use crate::db::{BrandStats, InventorySnapshot, ProfitSummary};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowQuery {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub orders: i64,
    pub gross_revenue: String,
    pub total_fees: String,
    pub total_net_profit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_roi_percent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_shelf_life_days: Option<String>,
    pub inventory: InventoryDto,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryDto {
    pub in_stock: i64,
    pub listed: i64,
    pub sold: i64,
    pub returned: i64,
    pub capital_tied_up: String,
}

impl From<InventorySnapshot> for InventoryDto {
    fn from(snapshot: InventorySnapshot) -> Self {
        InventoryDto {
            in_stock: snapshot.in_stock,
            listed: snapshot.listed,
            sold: snapshot.sold,
            returned: snapshot.returned,
            capital_tied_up: snapshot.capital_tied_up.to_canonical_string(),
        }
    }
}

fn summary_response(summary: ProfitSummary, inventory: InventorySnapshot) -> SummaryResponse {
    SummaryResponse {
        orders: summary.orders,
        gross_revenue: summary.gross_revenue.to_canonical_string(),
        total_fees: summary.total_fees.to_canonical_string(),
        total_net_profit: summary.total_net_profit.to_canonical_string(),
        avg_roi_percent: summary.avg_roi_percent.map(|r| r.to_canonical_string()),
        avg_shelf_life_days: summary
            .avg_shelf_life_days
            .map(|d| d.to_canonical_string()),
        inventory: inventory.into(),
    }
}

pub async fn get_summary(
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, AppError> {
    let (summary, inventory) = futures::try_join!(
        state.repo.profit_summary(params.from_ms, params.to_ms),
        state.repo.inventory_snapshot(),
    )?;

    Ok(Json(summary_response(summary, inventory)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandsResponse {
    pub brands: Vec<BrandDto>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandDto {
    pub brand: String,
    pub orders: i64,
    pub gross_revenue: String,
    pub total_net_profit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_roi_percent: Option<String>,
}

impl From<BrandStats> for BrandDto {
    fn from(stats: BrandStats) -> Self {
        BrandDto {
            brand: stats.brand,
            orders: stats.orders,
            gross_revenue: stats.gross_revenue.to_canonical_string(),
            total_net_profit: stats.total_net_profit.to_canonical_string(),
            avg_roi_percent: stats.avg_roi_percent.map(|r| r.to_canonical_string()),
        }
    }
}

pub async fn get_brands(
    Query(params): Query<WindowQuery>,
    State(state): State<AppState>,
) -> Result<Json<BrandsResponse>, AppError> {
    let brands = state
        .repo
        .brand_breakdown(params.from_ms, params.to_ms)
        .await?;

    Ok(Json(BrandsResponse {
        brands: brands.into_iter().map(BrandDto::from).collect(),
    }))
}
