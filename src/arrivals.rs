//! Upcoming arrivals for a route at a stop.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::model::FeedMessage;

/// Maximum number of arrivals returned per query.
pub const MAX_ARRIVALS: usize = 3;

/// Returns the minutes until the next arrivals of `route` at `stop`, soonest first.
///
/// Route and stop are compared exactly: `"101N"` does not match `"101S"` here,
/// unlike in alert matching. Arrivals that are not at least half a minute away
/// are dropped.
pub fn extract_arrivals(
    feed: &FeedMessage,
    route: &str,
    stop: &str,
    now: DateTime<Utc>,
) -> Vec<i64> {
    let now_ms = now.timestamp_millis();

    let mut etas: Vec<i64> = feed
        .trip_updates()
        .filter(|tu| tu.route_id == route)
        .flat_map(|tu| &tu.stop_time_updates)
        .filter(|stu| stu.stop_id == stop)
        .filter_map(|stu| stu.arrival_epoch_seconds)
        .filter_map(|arrival| eta_minutes(arrival, now_ms))
        .filter(|&eta| eta > 0)
        .collect();

    debug!(route, stop, matched = etas.len(), "Arrivals extracted");

    etas.sort();
    etas.truncate(MAX_ARRIVALS);
    etas
}

/// Whole minutes from `now_ms` to `arrival_secs`, rounding half a minute up.
fn eta_minutes(arrival_secs: i64, now_ms: i64) -> Option<i64> {
    let delta_ms = i128::from(arrival_secs) * 1000 - i128::from(now_ms);
    i64::try_from((delta_ms + 30_000).div_euclid(60_000)).ok()
}
