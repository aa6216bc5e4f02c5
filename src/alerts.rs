//! Service alert selection for a route and stop.
//!
//! An alert is reported when it is active at the query instant, at least one of
//! its informed entities belongs to a recognized agency and names the stop (any
//! direction) or the route (any zero padding), and it carries English text.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::ids::{normalize_route, normalize_stop};
use crate::model::{Alert, FeedMessage, InformedEntity, LocalizedText};

/// Agencies whose alerts apply to subway and bus queries.
pub const RECOGNIZED_AGENCIES: [&str; 2] = ["MTA NYCT", "MTASBWY"];

const ENGLISH: &str = "en";

/// Returns the deduplicated text of every alert that applies to `route`/`stop`
/// at `now`, in the order first seen in the feed.
pub fn match_alerts(
    feed: &FeedMessage,
    route: &str,
    stop: &str,
    now: DateTime<Utc>,
) -> Vec<String> {
    let query = Scope {
        route: normalize_route(route),
        stop: normalize_stop(stop),
    };

    let mut seen = HashSet::new();
    let mut matched = Vec::new();

    for alert in feed.alerts() {
        if !is_active(alert, now) {
            continue;
        }
        if !alert.informed_entities.iter().any(|ie| query.covers(ie)) {
            continue;
        }
        if let Some(text) = alert_text(alert) {
            if seen.insert(text.clone()) {
                matched.push(text);
            }
        }
    }

    debug!(route, stop, matched = matched.len(), "Alerts matched");
    matched
}

/// An alert is active when any of its windows contains `now`.
///
/// An alert without any active period is never active.
pub fn is_active(alert: &Alert, now: DateTime<Utc>) -> bool {
    alert.active_periods.iter().any(|w| w.contains(now))
}

struct Scope<'a> {
    route: &'a str,
    stop: &'a str,
}

impl Scope<'_> {
    fn covers(&self, entity: &InformedEntity) -> bool {
        let agency_ok = entity
            .agency_id
            .as_deref()
            .is_some_and(|a| RECOGNIZED_AGENCIES.contains(&a));
        let stop_ok = entity
            .stop_id
            .as_deref()
            .is_some_and(|s| normalize_stop(s) == self.stop);
        let route_ok = entity
            .route_id
            .as_deref()
            .is_some_and(|r| normalize_route(r) == self.route);

        agency_ok && (stop_ok || route_ok)
    }
}

/// English header and description joined as `"header: description"`, or
/// whichever of the two is present.
pub fn alert_text(alert: &Alert) -> Option<String> {
    let header = english(&alert.header_translations);
    let description = english(&alert.description_translations);

    match (header, description) {
        (Some(h), Some(d)) => Some(format!("{h}: {d}")),
        (Some(t), None) | (None, Some(t)) => Some(t.to_string()),
        (None, None) => None,
    }
}

fn english(translations: &[LocalizedText]) -> Option<&str> {
    translations
        .iter()
        .find(|t| t.language == ENGLISH)
        .map(|t| t.text.as_str())
        .filter(|text| !text.is_empty())
}
