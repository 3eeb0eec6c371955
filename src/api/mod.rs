pub mod analytics;
pub mod health;
pub mod intake;
pub mod inventory;
pub mod orders;
pub mod sync;

use crate::config::Config;
use crate::datasource::SaleSource;
use crate::db::Repository;
use crate::reconcile::{Intake, Reconciler};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub config: Config,
    pub reconciler: Arc<Reconciler>,
    pub intake: Arc<Intake>,
    pub stockx_source: Arc<dyn SaleSource>,
    pub notion_source: Option<Arc<dyn SaleSource>>,
}

impl AppState {
    pub fn new(
        repo: Arc<Repository>,
        config: Config,
        reconciler: Arc<Reconciler>,
        intake: Arc<Intake>,
        stockx_source: Arc<dyn SaleSource>,
        notion_source: Option<Arc<dyn SaleSource>>,
    ) -> Self {
        Self {
            repo,
            config,
            reconciler,
            intake,
            stockx_source,
            notion_source,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/inventory", get(inventory::get_inventory))
        .route("/v1/orders", get(orders::get_orders))
        .route("/v1/orders/:id/payout", post(orders::post_payout))
        .route("/v1/analytics/summary", get(analytics::get_summary))
        .route("/v1/analytics/brands", get(analytics::get_brands))
        .route("/v1/sync/stockx", post(sync::post_sync_stockx))
        .route("/v1/sync/notion", post(sync::post_sync_notion))
        .route("/v1/intake/purchases", post(intake::post_purchases))
        .layer(cors)
        .with_state(state)
}
