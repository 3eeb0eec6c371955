//! Notion bookkeeping database client.
//!
//! The business records manual sales in a Notion database; this source
//! queries it and extracts typed properties at the boundary, so dict-shaped
//! Notion payloads never leak past this module.

use super::{SaleSource, SourceError};
use crate::domain::{Decimal, ItemRef, Platform, SaleCandidate, SaleOrigin, SizeLabel, Sku};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use reqwest::Client;
use std::str::FromStr;
use tracing::{debug, warn};

const NOTION_VERSION: &str = "2022-06-28";

/// Notion data source over the database query endpoint.
#[derive(Debug, Clone)]
pub struct NotionSource {
    client: Client,
    base_url: String,
    token: String,
    database_id: String,
}

impl NotionSource {
    /// Create a new Notion data source.
    pub fn new(base_url: String, token: String, database_id: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            token,
            database_id,
        }
    }

    async fn query_page(
        &self,
        from_ms: i64,
        to_ms: i64,
        start_cursor: Option<&str>,
    ) -> Result<serde_json::Value, SourceError> {
        let url = format!("{}/v1/databases/{}/query", self.base_url, self.database_id);

        let mut body = serde_json::json!({
            "filter": {
                "and": [
                    {"property": "Sold At", "date": {"on_or_after": ms_to_date(from_ms)}},
                    {"property": "Sold At", "date": {"on_or_before": ms_to_date(to_ms)}}
                ]
            }
        });
        if let Some(cursor) = start_cursor {
            body["start_cursor"] = serde_json::json!(cursor);
        }

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .header("Notion-Version", NOTION_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = response.status();
        if status == 429 {
            return Err(SourceError::RateLimited);
        }
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
                message: "Notion query failed".to_string(),
            });
        }

        response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }
}

#[async_trait]
impl SaleSource for NotionSource {
    async fn fetch_sales(
        &self,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<SaleCandidate>, SourceError> {
        debug!("Querying Notion sales, from_ms={}, to_ms={}", from_ms, to_ms);

        let mut candidates = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .query_page(from_ms, to_ms, cursor.as_deref())
                .await?;

            let results = page
                .get("results")
                .and_then(|r| r.as_array())
                .ok_or_else(|| SourceError::Parse("Expected results array".to_string()))?;

            for row in results {
                match parse_row(row) {
                    Ok(candidate) => candidates.push(candidate),
                    Err(e) => {
                        warn!("Skipping unparseable Notion row: {}", e);
                    }
                }
            }

            let has_more = page
                .get("has_more")
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            if !has_more {
                break;
            }
            cursor = page
                .get("next_cursor")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string());
            if cursor.is_none() {
                break;
            }
        }

        Ok(candidates)
    }
}

/// Extract a candidate from one database row.
///
/// Rows without a usable sale date are skipped (the timestamp cannot be
/// invented); every other missing property survives as an empty field for
/// the gate to reject with a recorded reason.
pub(crate) fn parse_row(row: &serde_json::Value) -> Result<SaleCandidate, SourceError> {
    let props = row
        .get("properties")
        .ok_or_else(|| SourceError::Parse("properties missing".to_string()))?;

    let sold_at = date_prop(props, "Sold At")
        .ok_or_else(|| SourceError::Parse("Sold At missing or invalid".to_string()))?;

    let external_sale_id = rich_text_prop(props, "Sale ID").unwrap_or_default();
    let platform = select_prop(props, "Platform").unwrap_or_default();
    let sku = rich_text_prop(props, "SKU").unwrap_or_default();
    let size = select_prop(props, "Size").unwrap_or_default();
    let sale_price = number_prop(props, "Sale Price").unwrap_or_else(Decimal::zero);

    Ok(SaleCandidate {
        external_sale_id,
        platform: Platform::new(platform),
        item_ref: ItemRef::SkuSize {
            sku: Sku::new(sku),
            size: SizeLabel::new(size),
        },
        sale_price,
        sold_at,
        origin: SaleOrigin::Notion,
        source_payload: row.clone(),
    })
}

fn rich_text_prop(props: &serde_json::Value, name: &str) -> Option<String> {
    let text = props
        .get(name)?
        .get("rich_text")?
        .as_array()?
        .first()?
        .get("plain_text")?
        .as_str()?;
    Some(text.to_string())
}

fn select_prop(props: &serde_json::Value, name: &str) -> Option<String> {
    let value = props.get(name)?.get("select")?.get("name")?.as_str()?;
    Some(value.to_string())
}

fn number_prop(props: &serde_json::Value, name: &str) -> Option<Decimal> {
    let number = props.get(name)?.get("number")?;
    Decimal::from_str(&number.to_string()).ok()
}

fn date_prop(props: &serde_json::Value, name: &str) -> Option<DateTime<Utc>> {
    let start = props.get(name)?.get("date")?.get("start")?.as_str()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(start) {
        return Some(dt.with_timezone(&Utc));
    }
    // Date-only properties carry no time; pin them to noon UTC so shelf
    // life math lands on the right calendar day in European timezones.
    let date = NaiveDate::from_str(start).ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0)?))
}

fn ms_to_date(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or_else(Utc::now)
        .date_naive()
        .to_string()
}
