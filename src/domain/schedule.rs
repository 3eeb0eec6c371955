//! Platform fee schedule: immutable per-marketplace seller fee terms.

use crate::domain::{Decimal, Platform};
use serde::{Deserialize, Serialize};

/// Seller fee terms for one marketplace.
///
/// Configured once per platform and read-only to the engine. StockX, for
/// example, runs 9.5% plus a fixed €1.50 processing fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFeeSchedule {
    /// Marketplace this schedule belongs to.
    pub platform: Platform,
    /// Commission as a fraction of the sale price, in [0, 1].
    pub percentage_fee: Decimal,
    /// Flat processing fee per sale.
    pub fixed_processing_fee: Decimal,
    /// ISO 4217 currency code the fees are denominated in.
    pub currency: String,
}

impl PlatformFeeSchedule {
    /// Create a schedule.
    pub fn new(
        platform: Platform,
        percentage_fee: Decimal,
        fixed_processing_fee: Decimal,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            platform,
            percentage_fee,
            fixed_processing_fee,
            currency: currency.into(),
        }
    }

    /// Returns true when the percentage fee sits inside [0, 1].
    pub fn percentage_in_range(&self) -> bool {
        !self.percentage_fee.is_negative() && !(self.percentage_fee > Decimal::one())
    }
}
