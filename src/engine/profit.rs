//! Profitability calculator.
//!
//! Combines the VAT-aware purchase cost of an inventory item, the sale
//! price, and the fee model output into proceeds, profit, ROI, and shelf
//! life. Pure and synchronous; persistence policy stays with the caller.

use crate::domain::{Decimal, InventoryItem};
use crate::engine::fees::FeeBreakdown;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// Financial outcome of one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfitabilityResult {
    /// sale_price − total fee.
    pub net_proceeds: Decimal,
    /// sale_price − gross purchase price.
    pub gross_profit: Decimal,
    /// net_proceeds − gross purchase price.
    pub net_profit: Decimal,
    /// net_profit / gross purchase price × 100. None when the purchase
    /// price is not positive; the caller decides store-null vs reject.
    pub roi_percent: Option<Decimal>,
    /// Days held between purchase and sale, never negative. None when the
    /// item has no purchase date.
    pub shelf_life_days: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProfitError {
    #[error("ROI undefined: gross purchase price is not positive")]
    UndefinedRoi,
}

/// ROI as a percentage of the gross purchase price, rounded half-even to
/// 2 decimal places.
///
/// # Errors
/// `UndefinedRoi` when the purchase price is zero or negative; the division
/// is never attempted.
pub fn compute_roi(
    net_profit: Decimal,
    gross_purchase_price: Decimal,
) -> Result<Decimal, ProfitError> {
    if !gross_purchase_price.is_positive() {
        return Err(ProfitError::UndefinedRoi);
    }
    Ok((net_profit / gross_purchase_price * Decimal::hundred()).round_money())
}

/// Calendar days between purchase and sale, floored at zero.
///
/// Clock skew between a marketplace timestamp and a locally recorded
/// purchase date can make the raw difference negative.
pub fn shelf_life_days(
    purchase_date: Option<NaiveDate>,
    sold_at: DateTime<Utc>,
) -> Option<i64> {
    purchase_date.map(|bought| {
        (sold_at.date_naive() - bought)
            .num_days()
            .max(0)
    })
}

/// Compute the full profitability record for a sale.
///
/// Monetary outputs are rounded half-even to 2 decimal places. An absent
/// purchase date is not fatal: profit and ROI are still computed, shelf
/// life is None.
pub fn compute_profitability(
    item: &InventoryItem,
    sale_price: Decimal,
    sold_at: DateTime<Utc>,
    fee: &FeeBreakdown,
) -> ProfitabilityResult {
    let net_proceeds = (sale_price - fee.total_fee).round_money();
    let gross_profit = (sale_price - item.gross_purchase_price).round_money();
    let net_profit = (net_proceeds - item.gross_purchase_price).round_money();
    let roi_percent = compute_roi(net_profit, item.gross_purchase_price).ok();

    ProfitabilityResult {
        net_proceeds,
        gross_profit,
        net_profit,
        roi_percent,
        shelf_life_days: shelf_life_days(item.purchase_date, sold_at),
    }
}
