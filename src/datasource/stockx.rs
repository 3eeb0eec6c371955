//! StockX selling API client.

use super::{SaleSource, SourceError};
use crate::domain::{Decimal, ItemRef, Platform, SaleCandidate, SaleOrigin, SizeLabel, Sku};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use chrono::DateTime;
use reqwest::Client;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

/// StockX data source over the selling orders endpoint.
#[derive(Debug, Clone)]
pub struct StockxSource {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl StockxSource {
    /// Create a new StockX data source.
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn get_orders(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<serde_json::Value, SourceError> {
        let url = format!("{}/v2/selling/orders", self.base_url);
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        retry(backoff, || async {
            let mut request = self
                .client
                .get(&url)
                .query(&[("fromDate", from_ms), ("toDate", to_ms)]);
            if let Some(key) = &self.api_key {
                request = request.bearer_auth(key);
            }

            let response = request
                .send()
                .await
                .map_err(|e| backoff::Error::transient(SourceError::Network(e.to_string())))?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(SourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(SourceError::Http {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(SourceError::Http {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<serde_json::Value>()
                .await
                .map_err(|e| backoff::Error::permanent(SourceError::Parse(e.to_string())))
        })
        .await
    }
}

#[async_trait]
impl SaleSource for StockxSource {
    async fn fetch_sales(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SaleCandidate>, SourceError> {
        debug!("Fetching StockX orders, from_ms={}, to_ms={}", from_ms, to_ms);

        let response = self.get_orders(from_ms, to_ms).await?;
        let orders = response
            .get("orders")
            .and_then(|o| o.as_array())
            .ok_or_else(|| SourceError::Parse("Expected orders array".to_string()))?;

        let mut candidates = Vec::new();
        for order in orders {
            match parse_order(order) {
                Ok(candidate) => candidates.push(candidate),
                Err(e) => {
                    warn!("Failed to parse StockX order: {}", e);
                }
            }
        }

        Ok(candidates)
    }
}

/// Parse one order object into a candidate.
///
/// The raw object is retained as the candidate's source payload; blank
/// fields survive into the candidate so the gate can reject them with a
/// recorded reason instead of them vanishing here.
pub(crate) fn parse_order(order: &serde_json::Value) -> Result<SaleCandidate, SourceError> {
    let external_sale_id = string_field(order, "orderNumber").unwrap_or_default();

    let sold_at_raw = string_field(order, "soldAt")
        .ok_or_else(|| SourceError::Parse("soldAt missing".to_string()))?;
    let sold_at = DateTime::parse_from_rfc3339(&sold_at_raw)
        .map_err(|e| SourceError::Parse(format!("soldAt: {}", e)))?
        .with_timezone(&chrono::Utc);

    let sale_price = decimal_field(order, "amount")?;

    let product = order.get("product").unwrap_or(&serde_json::Value::Null);
    let sku = string_field(product, "styleId").unwrap_or_default();
    let size = string_field(product, "size").unwrap_or_default();

    Ok(SaleCandidate {
        external_sale_id,
        platform: Platform::new("stockx"),
        item_ref: ItemRef::SkuSize {
            sku: Sku::new(sku),
            size: SizeLabel::new(size),
        },
        sale_price,
        sold_at,
        origin: SaleOrigin::Stockx,
        source_payload: order.clone(),
    })
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Accept both string-typed and number-typed amounts; parse losslessly
/// from the JSON text either way.
fn decimal_field(value: &serde_json::Value, key: &str) -> Result<Decimal, SourceError> {
    let raw = value
        .get(key)
        .ok_or_else(|| SourceError::Parse(format!("{} missing", key)))?;
    let text = match raw {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        other => {
            return Err(SourceError::Parse(format!(
                "{} has unexpected type: {}",
                key, other
            )))
        }
    };
    Decimal::from_str(&text).map_err(|e| SourceError::Parse(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order_json() -> serde_json::Value {
        serde_json::json!({
            "orderNumber": "SX-123",
            "amount": "94.00",
            "currencyCode": "EUR",
            "soldAt": "2025-01-11T09:00:00Z",
            "product": {
                "styleId": "ASICS-GK20",
                "size": "EU38"
            }
        })
    }

    #[test]
    fn test_parse_order_complete() {
        let candidate = parse_order(&order_json()).unwrap();
        assert_eq!(candidate.external_sale_id, "SX-123");
        assert_eq!(candidate.platform, Platform::new("stockx"));
        assert_eq!(candidate.sale_price.to_canonical_string(), "94");
        assert_eq!(
            candidate.item_ref,
            ItemRef::SkuSize {
                sku: Sku::new("ASICS-GK20"),
                size: SizeLabel::new("EU38"),
            }
        );
        assert_eq!(candidate.origin, SaleOrigin::Stockx);
        assert_eq!(candidate.source_payload, order_json());
    }

    #[test]
    fn test_parse_order_numeric_amount() {
        let mut order = order_json();
        order["amount"] = serde_json::json!(94.5);
        let candidate = parse_order(&order).unwrap();
        assert_eq!(candidate.sale_price.to_canonical_string(), "94.5");
    }

    #[test]
    fn test_parse_order_missing_sold_at_fails() {
        let mut order = order_json();
        order.as_object_mut().unwrap().remove("soldAt");
        assert!(parse_order(&order).is_err());
    }

    #[test]
    fn test_parse_order_blank_fields_survive_to_gate() {
        let mut order = order_json();
        order.as_object_mut().unwrap().remove("orderNumber");
        order["product"]
            .as_object_mut()
            .unwrap()
            .remove("styleId");

        let candidate = parse_order(&order).unwrap();
        assert!(candidate.external_sale_id.is_empty());
        assert_eq!(
            candidate.missing_fields(),
            vec!["external_sale_id", "inventory_reference"]
        );
    }

    #[test]
    fn test_parse_order_bad_amount_type() {
        let mut order = order_json();
        order["amount"] = serde_json::json!({"value": 94});
        assert!(parse_order(&order).is_err());
    }
}
