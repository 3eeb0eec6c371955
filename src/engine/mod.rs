//! Pure computation engines for fee and profitability math.
//!
//! Nothing in here touches the database or the network; the reconciliation
//! gate feeds these functions and persists their output.

pub mod fees;
pub mod profit;

pub use fees::{compute_fee, FeeBreakdown, FeeError};
pub use profit::{
    compute_profitability, compute_roi, shelf_life_days, ProfitError, ProfitabilityResult,
};
