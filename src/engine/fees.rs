//! Platform fee model.
//!
//! Computes the seller-side fee a marketplace withholds from a sale:
//! a percentage of the sale price plus a fixed processing fee.

use crate::domain::{Decimal, PlatformFeeSchedule};
use thiserror::Error;

/// Breakdown of the fee withheld from one sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBreakdown {
    /// sale_price × percentage_fee, unrounded.
    pub percentage_component: Decimal,
    /// The schedule's fixed processing fee.
    pub fixed_component: Decimal,
    /// Sum of both components, rounded to the currency minor unit.
    pub total_fee: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("invalid fee schedule for {platform}: {reason}")]
    InvalidSchedule { platform: String, reason: String },
    #[error("sale price must be positive, got {0}")]
    NonPositivePrice(Decimal),
}

/// Compute the platform fee for a sale.
///
/// Pure function. The total is rounded half-even to 2 decimal places; the
/// components are kept unrounded so callers can audit the split.
///
/// # Errors
/// `InvalidSchedule` when the percentage fee is outside [0, 1] or the fixed
/// fee is negative; `NonPositivePrice` when `sale_price <= 0`.
pub fn compute_fee(
    sale_price: Decimal,
    schedule: &PlatformFeeSchedule,
) -> Result<FeeBreakdown, FeeError> {
    if !schedule.percentage_in_range() {
        return Err(FeeError::InvalidSchedule {
            platform: schedule.platform.to_string(),
            reason: format!(
                "percentage_fee {} outside [0, 1]",
                schedule.percentage_fee
            ),
        });
    }
    if schedule.fixed_processing_fee.is_negative() {
        return Err(FeeError::InvalidSchedule {
            platform: schedule.platform.to_string(),
            reason: format!(
                "fixed_processing_fee {} is negative",
                schedule.fixed_processing_fee
            ),
        });
    }
    if !sale_price.is_positive() {
        return Err(FeeError::NonPositivePrice(sale_price));
    }

    let percentage_component = sale_price * schedule.percentage_fee;
    let fixed_component = schedule.fixed_processing_fee;
    let total_fee = (percentage_component + fixed_component).round_money();

    Ok(FeeBreakdown {
        percentage_component,
        fixed_component,
        total_fee,
    })
}
