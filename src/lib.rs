pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod reconcile;

pub use config::Config;
pub use datasource::{
    AwinFeed, MockSaleSource, NotionSource, SaleSource, SourceError, StockxSource,
};
pub use db::{init_db, Repository};
pub use domain::{
    Decimal, InventoryItem, ItemRef, ItemStatus, Order, Platform, PlatformFeeSchedule,
    PurchaseRecord, SaleCandidate, SaleOrigin, SizeLabel, Sku,
};
pub use error::AppError;
pub use reconcile::{Intake, Reconciler};
