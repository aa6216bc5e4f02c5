//! Query orchestration: fetch, decode, extract, assemble.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::alerts::match_alerts;
use crate::arrivals::extract_arrivals;
use crate::error::QueryError;
use crate::fetch::FeedSource;
use crate::model::FeedMessage;
use crate::parser::decode_feed;
use crate::routes::{FeedRouteTable, VehicleType};

/// Result of one route/stop query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryResponse {
    pub route: String,
    pub stop: String,
    /// Minutes until the next arrivals, soonest first.
    pub arrivals: Vec<i64>,
    pub alerts: Vec<String>,
}

/// A validated query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub route: String,
    pub stop: String,
    pub vehicle_type: VehicleType,
}

impl Query {
    /// Fails with [`QueryError::InvalidRequest`] if any parameter is blank or
    /// the vehicle type is unknown.
    pub fn parse(route: &str, stop: &str, vehicle_type: &str) -> Result<Self, QueryError> {
        let route = route.trim();
        let stop = stop.trim();
        if route.is_empty() || stop.is_empty() || vehicle_type.trim().is_empty() {
            return Err(QueryError::InvalidRequest(
                "missing ?stop=STOP_ID&route=ROUTE_ID&type=TYPE".to_string(),
            ));
        }

        Ok(Self {
            route: route.to_string(),
            stop: stop.to_string(),
            vehicle_type: vehicle_type.parse()?,
        })
    }
}

/// Answers "next arrivals and active alerts for route R at stop S".
///
/// Holds no per-query state; one engine can serve concurrent queries.
#[derive(Debug)]
pub struct FeedQueryEngine<S, R> {
    source: S,
    routes: R,
    alert_feed_url: String,
}

impl<S: FeedSource, R: FeedRouteTable> FeedQueryEngine<S, R> {
    pub fn new(source: S, routes: R, alert_feed_url: impl Into<String>) -> Self {
        Self {
            source,
            routes,
            alert_feed_url: alert_feed_url.into(),
        }
    }

    pub async fn run_query(
        &self,
        route: &str,
        stop: &str,
        vehicle_type: &str,
    ) -> Result<QueryResponse, QueryError> {
        let query = Query::parse(route, stop, vehicle_type)?;
        self.run_query_at(&query, Utc::now()).await
    }

    /// Runs `query` as if the current time were `now`.
    ///
    /// Both feeds are fetched concurrently; if either fails the whole query
    /// fails.
    #[tracing::instrument(skip(self, query), fields(route = %query.route, stop = %query.stop, vehicle_type = %query.vehicle_type))]
    pub async fn run_query_at(
        &self,
        query: &Query,
        now: DateTime<Utc>,
    ) -> Result<QueryResponse, QueryError> {
        let trip_url = self
            .routes
            .resolve_feed_url(&query.route, query.vehicle_type);
        debug!(trip_url = %trip_url, "Resolved trip update feed");

        let (trip_feed, alert_feed) =
            tokio::try_join!(self.load(&trip_url), self.load(&self.alert_feed_url))?;

        let response = QueryResponse {
            route: query.route.clone(),
            stop: query.stop.clone(),
            arrivals: extract_arrivals(&trip_feed, &query.route, &query.stop, now),
            alerts: match_alerts(&alert_feed, &query.route, &query.stop, now),
        };

        info!(
            arrivals = response.arrivals.len(),
            alerts = response.alerts.len(),
            "Query answered"
        );
        Ok(response)
    }

    #[tracing::instrument(skip(self))]
    async fn load(&self, url: &str) -> Result<FeedMessage, QueryError> {
        let bytes =
            self.source
                .fetch_bytes(url)
                .await
                .map_err(|e| QueryError::FeedUnavailable {
                    url: url.to_string(),
                    reason: format!("{e:#}"),
                })?;
        debug!(url, bytes = bytes.len(), "Feed bytes received, decoding");

        decode_feed(&bytes).map_err(|source| QueryError::MalformedFeed {
            url: url.to_string(),
            source,
        })
    }
}
