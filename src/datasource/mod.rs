//! Data source abstraction for fetching sale candidates and purchase
//! records from external systems.

use crate::domain::SaleCandidate;
use async_trait::async_trait;
use std::fmt;

pub mod awin;
pub mod mock;
pub mod notion;
pub mod stockx;

pub use awin::AwinFeed;
pub use mock::MockSaleSource;
pub use notion::NotionSource;
pub use stockx::StockxSource;

/// Source of sale notifications.
///
/// Implementations must handle pagination, retry/backoff, and rate
/// limiting; records they return are still unvalidated candidates and go
/// through the reconciliation gate like any other input.
#[async_trait]
pub trait SaleSource: Send + Sync + fmt::Debug {
    /// Fetch sales completed within a time range.
    ///
    /// # Arguments
    /// * `from_ms` - Start time in milliseconds (inclusive)
    /// * `to_ms` - End time in milliseconds (inclusive)
    async fn fetch_sales(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SaleCandidate>, SourceError>;
}

/// Error type for data source operations.
#[derive(Debug, Clone)]
pub enum SourceError {
    /// Network error (e.g., connection timeout, DNS failure)
    Network(String),
    /// HTTP error (e.g., 401 bad token, 5xx server error)
    Http { status: u16, message: String },
    /// Parsing error (invalid JSON/CSV or malformed response)
    Parse(String),
    /// Rate limit exceeded (caller should implement backoff)
    RateLimited,
    /// Source not configured (e.g., missing API token)
    NotConfigured(String),
    /// Other error
    Other(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Network(msg) => write!(f, "Network error: {}", msg),
            SourceError::Http { status, message } => {
                write!(f, "HTTP error {}: {}", status, message)
            }
            SourceError::Parse(msg) => write!(f, "Parse error: {}", msg),
            SourceError::RateLimited => write!(f, "Rate limited"),
            SourceError::NotConfigured(msg) => write!(f, "Source not configured: {}", msg),
            SourceError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for SourceError {}
