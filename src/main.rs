use soleledger::datasource::{AwinFeed, NotionSource, StockxSource};
use soleledger::reconcile::{Intake, Reconciler};
use soleledger::{api, config::Config, db::init_db, Repository, SaleSource};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let reconciler = Arc::new(Reconciler::new(
        repo.clone(),
        config.fee_schedules.clone(),
        config.roi_policy,
    ));
    if let Err(e) = reconciler.seed_platforms().await {
        eprintln!("Failed to seed platform fee schedules: {}", e);
        std::process::exit(1);
    }

    let intake = Arc::new(Intake::new(repo.clone()));

    // Optional AWIN purchase feed, ingested once at startup.
    if let Some(feed_path) = &config.awin_feed_path {
        let feed = AwinFeed::new(config.default_vat_rate);
        match feed.parse_path(Path::new(feed_path)) {
            Ok(records) => {
                let report = intake.ingest(&records).await;
                tracing::info!(
                    path = %feed_path,
                    created = report.created,
                    skipped_duplicate = report.skipped_duplicate,
                    rejected_invalid = report.rejected_invalid,
                    "AWIN feed ingested"
                );
            }
            Err(e) => {
                eprintln!("Failed to parse AWIN feed {}: {}", feed_path, e);
                std::process::exit(1);
            }
        }
    }

    let stockx_source: Arc<dyn SaleSource> = Arc::new(StockxSource::new(
        config.stockx_api_url.clone(),
        config.stockx_api_key.clone(),
    ));
    let notion_source: Option<Arc<dyn SaleSource>> =
        match (&config.notion_token, &config.notion_database_id) {
            (Some(token), Some(database_id)) => Some(Arc::new(NotionSource::new(
                config.notion_api_url.clone(),
                token.clone(),
                database_id.clone(),
            ))),
            _ => None,
        };

    // Create router
    let app = api::create_router(api::AppState::new(
        repo,
        config,
        reconciler,
        intake,
        stockx_source,
        notion_source,
    ));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
