use axum::http::StatusCode;
use chrono::{TimeZone, Utc};
use soleledger::api::{self, AppState};
use soleledger::config::Config;
use soleledger::datasource::MockSaleSource;
use soleledger::db::init_db;
use soleledger::domain::{
    Decimal, ItemRef, Platform, PurchaseRecord, SaleCandidate, SaleOrigin, SizeLabel, Sku,
};
use soleledger::reconcile::{Intake, Reconciler};
use soleledger::Repository;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app() -> (axum::Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let mut env = HashMap::new();
    env.insert("DATABASE_PATH".to_string(), db_path);
    let config = Config::from_env_map(env).expect("config failed");

    let reconciler = Arc::new(Reconciler::new(
        repo.clone(),
        config.fee_schedules.clone(),
        config.roi_policy,
    ));
    reconciler.seed_platforms().await.unwrap();
    let intake = Arc::new(Intake::new(repo.clone()));

    // Two pairs bought at 50 gross (no VAT for round numbers), one sold.
    for (external_ref, sku, brand, size) in [
        ("AW-1", "ASICS-GK20", "Asics", "EU38"),
        ("AW-2", "NIKE-DUNK", "Nike", "EU42"),
    ] {
        let rec = PurchaseRecord::new(
            Some(external_ref.to_string()),
            Sku::new(sku),
            format!("{} Runner", brand),
            brand.to_string(),
            SizeLabel::new(size),
            "awin:shop".to_string(),
            Decimal::from_str("50").unwrap(),
            Decimal::zero(),
            chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
            None,
        );
        let product_id = repo
            .upsert_product(&rec.sku, &rec.product_name, &rec.brand)
            .await
            .unwrap();
        repo.insert_inventory_item(product_id, &rec, rec.gross_price, Decimal::zero())
            .await
            .unwrap()
            .unwrap();
    }

    let candidate = SaleCandidate {
        external_sale_id: "SX-1".to_string(),
        platform: Platform::new("stockx"),
        item_ref: ItemRef::SkuSize {
            sku: Sku::new("ASICS-GK20"),
            size: SizeLabel::new("EU38"),
        },
        sale_price: Decimal::from_str("100").unwrap(),
        sold_at: Utc.with_ymd_and_hms(2025, 1, 11, 9, 0, 0).unwrap(),
        origin: SaleOrigin::Stockx,
        source_payload: serde_json::json!({}),
    };
    reconciler.reconcile(&candidate).await.unwrap();

    let state = AppState::new(
        repo,
        config,
        reconciler,
        intake,
        Arc::new(MockSaleSource::new()),
        None,
    );

    (api::create_router(state), temp_dir)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get(uri: &str) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_summary_endpoint() {
    let (app, _temp) = setup_test_app().await;

    let response = app.oneshot(get("/v1/analytics/summary")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["orders"], 1);
    assert_eq!(body["grossRevenue"], "100");
    assert_eq!(body["totalFees"], "11");
    assert_eq!(body["totalNetProfit"], "39");
    assert_eq!(body["avgRoiPercent"], "78");
    assert_eq!(body["avgShelfLifeDays"], "10");

    // The unsold Nike pair still ties up its purchase price.
    assert_eq!(body["inventory"]["inStock"], 1);
    assert_eq!(body["inventory"]["sold"], 1);
    assert_eq!(body["inventory"]["capitalTiedUp"], "50");
}

#[tokio::test]
async fn test_summary_window_excludes_sale() {
    let (app, _temp) = setup_test_app().await;

    let response = app
        .oneshot(get("/v1/analytics/summary?fromMs=0&toMs=1000"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["orders"], 0);
    assert_eq!(body["grossRevenue"], "0");
    assert!(body.get("avgRoiPercent").is_none());
    // Inventory is a point-in-time snapshot, unaffected by the window.
    assert_eq!(body["inventory"]["sold"], 1);
}

#[tokio::test]
async fn test_brands_endpoint() {
    let (app, _temp) = setup_test_app().await;

    let response = app.oneshot(get("/v1/analytics/brands")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let brands = body["brands"].as_array().unwrap();
    // Only the sold Asics pair shows up; unsold stock has no orders.
    assert_eq!(brands.len(), 1);
    assert_eq!(brands[0]["brand"], "Asics");
    assert_eq!(brands[0]["orders"], 1);
    assert_eq!(brands[0]["grossRevenue"], "100");
    assert_eq!(brands[0]["totalNetProfit"], "39");
    assert_eq!(brands[0]["avgRoiPercent"], "78");
}
