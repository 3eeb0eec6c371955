use axum::extract::{Query, State};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::AppState;
use crate::datasource::SaleSource;
use crate::error::AppError;
use crate::reconcile::ReconcileReport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncQuery {
    pub from_ms: Option<i64>,
    pub to_ms: Option<i64>,
}

pub async fn post_sync_stockx(
    Query(params): Query<SyncQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, AppError> {
    let source = state.stockx_source.clone();
    run_sync("stockx", source.as_ref(), &state, params).await
}

pub async fn post_sync_notion(
    Query(params): Query<SyncQuery>,
    State(state): State<AppState>,
) -> Result<Json<ReconcileReport>, AppError> {
    let Some(source) = state.notion_source.clone() else {
        return Err(AppError::BadRequest(
            "Notion source not configured (NOTION_TOKEN, NOTION_DATABASE_ID)".to_string(),
        ));
    };
    run_sync("notion", source.as_ref(), &state, params).await
}

async fn run_sync(
    source_name: &str,
    source: &dyn SaleSource,
    state: &AppState,
    params: SyncQuery,
) -> Result<Json<ReconcileReport>, AppError> {
    let from_ms = params.from_ms.unwrap_or(0);
    let to_ms = params.to_ms.unwrap_or_else(|| Utc::now().timestamp_millis());
    if from_ms > to_ms {
        return Err(AppError::BadRequest("fromMs is after toMs".to_string()));
    }

    let candidates = source.fetch_sales(from_ms, to_ms).await?;
    info!(
        source = source_name,
        candidates = candidates.len(),
        from_ms = from_ms,
        to_ms = to_ms,
        "Fetched sale candidates"
    );

    let report = state.reconciler.reconcile_batch(&candidates).await;
    Ok(Json(report))
}
