//! Feed endpoints and credentials.
//!
//! Loaded from the environment (after `.env`) or from a JSON file:
//! ```json
//! {
//!   "bus_api_key": "...",
//!   "alert_feed_url": "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fall-alerts"
//! }
//! ```
//! Missing fields fall back to the public MTA endpoints.

use anyhow::{Context, Result};
use serde::Deserialize;

pub const DEFAULT_SUBWAY_FEED_BASE_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs";
pub const DEFAULT_BUS_FEED_URL: &str = "https://gtfsrt.prod.obanyc.com/tripUpdates";
pub const DEFAULT_ALERT_FEED_URL: &str =
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fall-alerts";
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Subway trip-update feeds are this URL plus a per-line suffix.
    pub subway_feed_base_url: String,
    pub bus_feed_url: String,
    /// The single alert feed consulted for every query.
    pub alert_feed_url: String,
    /// Sent as the `key` query parameter on the bus feed.
    pub bus_api_key: Option<String>,
    /// Sent as a header on every feed request.
    pub api_key: Option<String>,
    pub api_key_header: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            subway_feed_base_url: DEFAULT_SUBWAY_FEED_BASE_URL.to_string(),
            bus_feed_url: DEFAULT_BUS_FEED_URL.to_string(),
            alert_feed_url: DEFAULT_ALERT_FEED_URL.to_string(),
            bus_api_key: None,
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }
}

impl FeedConfig {
    /// Loads the config from a JSON file at `path`.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{path}'"))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config file '{path}'"))?;
        Ok(config)
    }

    /// Reads overrides from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            subway_feed_base_url: var("SUBWAY_FEED_BASE_URL")
                .unwrap_or(defaults.subway_feed_base_url),
            bus_feed_url: var("BUS_FEED_URL").unwrap_or(defaults.bus_feed_url),
            alert_feed_url: var("ALERT_FEED_URL").unwrap_or(defaults.alert_feed_url),
            bus_api_key: var("MTA_BUS_API_KEY"),
            api_key: var("MTA_API_KEY"),
            api_key_header: var("MTA_API_KEY_HEADER").unwrap_or(defaults.api_key_header),
        }
    }
}
