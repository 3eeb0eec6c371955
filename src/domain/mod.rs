//! Domain types for the sale reconciliation and profitability engine.
//!
//! This module provides:
//! - Lossless monetary handling via the Decimal wrapper
//! - Domain primitives: Sku, SizeLabel, Platform, ItemStatus
//! - Inventory, candidate, order, and purchase record types
//! - Platform fee schedules

pub mod candidate;
pub mod decimal;
pub mod item;
pub mod order;
pub mod primitives;
pub mod purchase;
pub mod schedule;

pub use candidate::{ItemRef, SaleCandidate, SaleOrigin};
pub use decimal::Decimal;
pub use item::InventoryItem;
pub use order::{Order, OrderDraft};
pub use primitives::{ItemStatus, Platform, SizeLabel, Sku};
pub use purchase::PurchaseRecord;
pub use schedule::PlatformFeeSchedule;
