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

const SOLD_AT_MS: i64 = 1_736_586_000_000; // 2025-01-11T09:00:00Z

async fn setup_test_app() -> (axum::Router, Arc<Repository>, TempDir) {
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

    let state = AppState::new(
        repo.clone(),
        config,
        reconciler.clone(),
        intake,
        Arc::new(MockSaleSource::new()),
        None,
    );

    // Seed one reconciled sale.
    let rec = PurchaseRecord::new(
        Some("AW-1".to_string()),
        Sku::new("ASICS-GK20"),
        "Asics Gel-Kayano 20".to_string(),
        "Asics".to_string(),
        SizeLabel::new("EU38"),
        "awin:asics".to_string(),
        Decimal::from_str("88.23").unwrap(),
        Decimal::from_str("0.19").unwrap(),
        chrono::NaiveDate::from_ymd_opt(2025, 1, 1),
        None,
    );
    let product_id = repo
        .upsert_product(&rec.sku, &rec.product_name, &rec.brand)
        .await
        .unwrap();
    repo.insert_inventory_item(
        product_id,
        &rec,
        Decimal::from_str("74.14").unwrap(),
        Decimal::from_str("14.09").unwrap(),
    )
    .await
    .unwrap()
    .unwrap();

    let candidate = SaleCandidate {
        external_sale_id: "SX-123".to_string(),
        platform: Platform::new("stockx"),
        item_ref: ItemRef::SkuSize {
            sku: Sku::new("ASICS-GK20"),
            size: SizeLabel::new("EU38"),
        },
        sale_price: Decimal::from_str("94").unwrap(),
        sold_at: Utc.timestamp_millis_opt(SOLD_AT_MS).unwrap(),
        origin: SaleOrigin::Stockx,
        source_payload: serde_json::json!({"orderNumber": "SX-123"}),
    };
    reconciler.reconcile(&candidate).await.unwrap();

    (api::create_router(state), repo, temp_dir)
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
async fn test_list_orders() {
    let (app, _repo, _temp) = setup_test_app().await;

    let response = app.oneshot(get("/v1/orders")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let orders = body["orders"].as_array().unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0]["externalId"], "SX-123");
    assert_eq!(orders[0]["platform"], "stockx");
    assert_eq!(orders[0]["soldAtMs"], SOLD_AT_MS);
    assert_eq!(orders[0]["netProfit"], "-4.66");
    assert_eq!(orders[0]["roiPercent"], "-5.28");
    assert_eq!(orders[0]["shelfLifeDays"], 10);
    assert_eq!(orders[0]["payoutReceived"], false);
    assert!(orders[0].get("payoutDate").is_none());
}

#[tokio::test]
async fn test_list_orders_platform_filter() {
    let (app, _repo, _temp) = setup_test_app().await;

    let hit = app.clone().oneshot(get("/v1/orders?platform=StockX")).await.unwrap();
    assert_eq!(body_json(hit).await["orders"].as_array().unwrap().len(), 1);

    let miss = app.oneshot(get("/v1/orders?platform=goat")).await.unwrap();
    assert_eq!(body_json(miss).await["orders"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_orders_window_filter() {
    let (app, _repo, _temp) = setup_test_app().await;

    let uri = format!("/v1/orders?fromMs={}&toMs={}", SOLD_AT_MS - 10, SOLD_AT_MS + 10);
    let hit = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(body_json(hit).await["orders"].as_array().unwrap().len(), 1);

    let uri = format!("/v1/orders?fromMs={}", SOLD_AT_MS + 10);
    let miss = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(body_json(miss).await["orders"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_payout_confirmation() {
    let (app, repo, _temp) = setup_test_app().await;

    let orders = repo.list_orders(None, None, None).await.unwrap();
    let order_id = orders[0].id;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/v1/orders/{}/payout", order_id))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"payoutDate": "2025-01-20"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["payoutReceived"], true);
    assert_eq!(body["payoutDate"], "2025-01-20");

    // Every other field stayed as reconciled.
    assert_eq!(body["netProfit"], "-4.66");
}

#[tokio::test]
async fn test_payout_unknown_order() {
    let (app, _repo, _temp) = setup_test_app().await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/orders/9999/payout")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"payoutDate": "2025-01-20"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_payout_bad_date() {
    let (app, repo, _temp) = setup_test_app().await;
    let order_id = repo.list_orders(None, None, None).await.unwrap()[0].id;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/v1/orders/{}/payout", order_id))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(
            serde_json::json!({"payoutDate": "20/01/2025"}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
