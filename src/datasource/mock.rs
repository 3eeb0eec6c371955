//! Mock sale source for testing without network calls.

use super::{SaleSource, SourceError};
use crate::domain::SaleCandidate;
use async_trait::async_trait;

/// Mock sale source that returns predefined candidates.
#[derive(Debug, Clone, Default)]
pub struct MockSaleSource {
    sales: Vec<SaleCandidate>,
    fail_with: Option<String>,
}

impl MockSaleSource {
    /// Create a new mock source with no data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sale candidate to the mock source.
    pub fn with_sale(mut self, sale: SaleCandidate) -> Self {
        self.sales.push(sale);
        self
    }

    /// Add multiple sale candidates to the mock source.
    pub fn with_sales(mut self, sales: Vec<SaleCandidate>) -> Self {
        self.sales.extend(sales);
        self
    }

    /// Make every fetch fail with the given message.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }
}

#[async_trait]
impl SaleSource for MockSaleSource {
    async fn fetch_sales(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SaleCandidate>, SourceError> {
        if let Some(message) = &self.fail_with {
            return Err(SourceError::Other(message.clone()));
        }

        Ok(self
            .sales
            .iter()
            .filter(|s| {
                let ms = s.sold_at.timestamp_millis();
                ms >= from_ms && ms <= to_ms
            })
            .cloned()
            .collect())
    }
}
