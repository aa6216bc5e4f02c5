//! Which trip-update feed carries a given route.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::FeedConfig;
use crate::error::QueryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Rail,
    Bus,
}

impl FromStr for VehicleType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rail" | "train" | "subway" => Ok(VehicleType::Rail),
            "bus" => Ok(VehicleType::Bus),
            other => Err(QueryError::InvalidRequest(format!(
                "unknown vehicle type '{other}', expected 'rail' or 'bus'"
            ))),
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleType::Rail => f.write_str("rail"),
            VehicleType::Bus => f.write_str("bus"),
        }
    }
}

/// Static mapping from a route to the endpoint serving its trip updates.
pub trait FeedRouteTable: Send + Sync {
    /// Never fails: unknown routes resolve to a default endpoint.
    fn resolve_feed_url(&self, route: &str, vehicle_type: VehicleType) -> String;
}

/// Subway feed suffixes appended to the base URL, by upper-cased route.
const SUBWAY_FEEDS: &[(&[&str], &str)] = &[
    (&["1", "2", "3", "4", "5", "6", "6X", "7", "7X", "S"], ""),
    (&["A", "C", "E"], "-ace"),
    (&["B", "D", "F", "M"], "-bdfm"),
    (&["G"], "-g"),
    (&["J", "Z"], "-jz"),
    (&["L"], "-l"),
    (&["N", "Q", "R", "W"], "-nqrw"),
];

/// Route table for the MTA subway and bus feeds.
#[derive(Debug, Clone)]
pub struct MtaRouteTable {
    subway_base: String,
    bus_url: String,
}

impl MtaRouteTable {
    /// Builds the table from config, appending the bus API key to the bus URL
    /// as a `key` query parameter when one is configured.
    pub fn new(config: &FeedConfig) -> Result<Self> {
        let mut bus_url = reqwest::Url::parse(&config.bus_feed_url)
            .with_context(|| format!("invalid bus feed URL '{}'", config.bus_feed_url))?;
        if let Some(key) = &config.bus_api_key {
            bus_url.query_pairs_mut().append_pair("key", key);
        }

        Ok(Self {
            subway_base: config.subway_feed_base_url.clone(),
            bus_url: bus_url.into(),
        })
    }

    fn subway_url(&self, suffix: &str) -> String {
        format!("{}{}", self.subway_base, suffix)
    }
}

impl FeedRouteTable for MtaRouteTable {
    fn resolve_feed_url(&self, route: &str, vehicle_type: VehicleType) -> String {
        if vehicle_type == VehicleType::Bus {
            return self.bus_url.clone();
        }

        let route = route.to_ascii_uppercase();
        if let Some((_, suffix)) = SUBWAY_FEEDS
            .iter()
            .find(|(routes, _)| routes.contains(&route.as_str()))
        {
            return self.subway_url(suffix);
        }

        // Manhattan bus routes (M15, M101, ...) live in the bus feed.
        let mut chars = route.chars();
        if chars.next() == Some('M') && chars.next().is_some_and(|c| c.is_ascii_digit()) {
            return self.bus_url.clone();
        }

        warn!(route = %route, "Unknown route, using fallback subway feed");
        self.subway_url("")
    }
}
