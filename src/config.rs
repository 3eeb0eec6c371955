use crate::domain::{Decimal, Platform, PlatformFeeSchedule};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Environment variable prefix for per-platform fee schedule overrides,
/// e.g. `FEE_SCHEDULE_STOCKX=0.095,1.50,EUR`.
const FEE_SCHEDULE_PREFIX: &str = "FEE_SCHEDULE_";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub stockx_api_url: String,
    pub stockx_api_key: Option<String>,
    pub notion_api_url: String,
    pub notion_token: Option<String>,
    pub notion_database_id: Option<String>,
    pub awin_feed_path: Option<String>,
    pub default_vat_rate: Decimal,
    pub roi_policy: RoiPolicy,
    pub fee_schedules: Vec<PlatformFeeSchedule>,
}

/// What to do with an order whose purchase price makes ROI undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoiPolicy {
    /// Persist the order with a NULL ROI.
    StoreNull,
    /// Reject the candidate.
    Reject,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let stockx_api_url = env_map
            .get("STOCKX_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.stockx.com".to_string());

        let stockx_api_key = env_map.get("STOCKX_API_KEY").cloned();

        let notion_api_url = env_map
            .get("NOTION_API_URL")
            .cloned()
            .unwrap_or_else(|| "https://api.notion.com".to_string());

        let notion_token = env_map.get("NOTION_TOKEN").cloned();
        let notion_database_id = env_map.get("NOTION_DATABASE_ID").cloned();
        let awin_feed_path = env_map.get("AWIN_FEED_PATH").cloned();

        let default_vat_rate = parse_decimal_var(&env_map, "DEFAULT_VAT_RATE", "0.19")?;
        if default_vat_rate.is_negative() || default_vat_rate > Decimal::one() {
            return Err(ConfigError::InvalidValue(
                "DEFAULT_VAT_RATE".to_string(),
                "must be in [0, 1]".to_string(),
            ));
        }

        let roi_policy = match env_map
            .get("ROI_POLICY")
            .map(|s| s.as_str())
            .unwrap_or("store_null")
        {
            "store_null" => RoiPolicy::StoreNull,
            "reject" => RoiPolicy::Reject,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ROI_POLICY".to_string(),
                    format!("must be store_null or reject, got {}", other),
                ))
            }
        };

        let fee_schedules = build_fee_schedules(&env_map)?;

        Ok(Config {
            port,
            database_path,
            stockx_api_url,
            stockx_api_key,
            notion_api_url,
            notion_token,
            notion_database_id,
            awin_feed_path,
            default_vat_rate,
            roi_policy,
            fee_schedules,
        })
    }
}

fn parse_decimal_var(
    env_map: &HashMap<String, String>,
    key: &str,
    default: &str,
) -> Result<Decimal, ConfigError> {
    let raw = env_map.get(key).map(|s| s.as_str()).unwrap_or(default);
    Decimal::from_str(raw).map_err(|_| {
        ConfigError::InvalidValue(key.to_string(), "must be a decimal number".to_string())
    })
}

/// Built-in schedules, overridable per platform via
/// `FEE_SCHEDULE_<NAME>=percentage,fixed,currency`.
fn build_fee_schedules(
    env_map: &HashMap<String, String>,
) -> Result<Vec<PlatformFeeSchedule>, ConfigError> {
    let mut schedules: Vec<PlatformFeeSchedule> = vec![
        schedule("stockx", "0.095", "1.50"),
        schedule("goat", "0.095", "5.00"),
        schedule("ebay", "0.08", "0.35"),
    ];

    for (key, value) in env_map {
        let Some(name) = key.strip_prefix(FEE_SCHEDULE_PREFIX) else {
            continue;
        };
        if name.is_empty() {
            return Err(ConfigError::InvalidValue(
                key.clone(),
                "platform name missing".to_string(),
            ));
        }
        let parsed = parse_schedule_override(name, value)
            .ok_or_else(|| ConfigError::InvalidValue(key.clone(), value.clone()))?;
        if !parsed.percentage_in_range() {
            return Err(ConfigError::InvalidValue(
                key.clone(),
                "percentage fee must be in [0, 1]".to_string(),
            ));
        }
        match schedules
            .iter_mut()
            .find(|s| s.platform == parsed.platform)
        {
            Some(existing) => *existing = parsed,
            None => schedules.push(parsed),
        }
    }

    Ok(schedules)
}

fn schedule(name: &str, pct: &str, fixed: &str) -> PlatformFeeSchedule {
    PlatformFeeSchedule::new(
        Platform::new(name),
        Decimal::from_str(pct).unwrap_or_else(|_| Decimal::zero()),
        Decimal::from_str(fixed).unwrap_or_else(|_| Decimal::zero()),
        "EUR",
    )
}

fn parse_schedule_override(name: &str, value: &str) -> Option<PlatformFeeSchedule> {
    let mut parts = value.split(',').map(str::trim);
    let pct = Decimal::from_str(parts.next()?).ok()?;
    let fixed = Decimal::from_str(parts.next()?).ok()?;
    let currency = parts.next().unwrap_or("EUR");
    if parts.next().is_some() {
        return None;
    }
    Some(PlatformFeeSchedule::new(
        Platform::new(name),
        pct,
        fixed,
        currency,
    ))
}
