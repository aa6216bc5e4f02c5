//! Output formatting and persistence for query results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::engine::QueryResponse;
use crate::error::QueryError;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// Logs a response as human-readable lines.
pub fn print_pretty(response: &QueryResponse) {
    if response.arrivals.is_empty() {
        info!(route = %response.route, stop = %response.stop, "No upcoming arrivals");
    }
    for minutes in &response.arrivals {
        info!(route = %response.route, stop = %response.stop, "Arriving in {minutes} min");
    }
    for alert in &response.alerts {
        info!(route = %response.route, "Alert: {alert}");
    }
}

/// Logs a response as pretty-printed JSON.
pub fn print_json(response: &QueryResponse) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(response)?);
    Ok(())
}

/// One CSV row per sampled query.
#[derive(Debug, Default, Serialize)]
pub struct QueryRecord {
    pub timestamp: DateTime<Utc>,
    pub route: String,
    pub stop: String,
    /// Minutes, `;`-separated, soonest first.
    pub arrivals: String,
    pub alert_count: usize,
    pub error_type: Option<String>,
    pub error_message: Option<String>,
}

impl QueryRecord {
    pub fn from_response(timestamp: DateTime<Utc>, response: &QueryResponse) -> Self {
        QueryRecord {
            timestamp,
            route: response.route.clone(),
            stop: response.stop.clone(),
            arrivals: response
                .arrivals
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(";"),
            alert_count: response.alerts.len(),
            ..Default::default()
        }
    }

    /// Record for a failed sample.
    pub fn from_error(timestamp: DateTime<Utc>, route: &str, stop: &str, err: &QueryError) -> Self {
        QueryRecord {
            timestamp,
            route: route.to_string(),
            stop: stop.to_string(),
            error_type: Some(err.kind().to_string()),
            error_message: Some(err.to_string()),
            ..Default::default()
        }
    }
}

/// Appends a [`QueryRecord`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_record(path: &str, record: &QueryRecord) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV record");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    writer.serialize(record)?;
    writer.flush()?;

    Ok(())
}
