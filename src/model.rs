//! Typed, read-only view of a decoded realtime feed.
//!
//! Only trip updates and alerts are projected out of the wire message; every
//! other entity kind is dropped by the decoder. Values are built fresh per
//! decode and never mutated afterwards.

use chrono::{DateTime, Utc};

/// A decoded feed: the trip updates and alerts it carried, in wire order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedMessage {
    pub entities: Vec<Entity>,
}

impl FeedMessage {
    pub fn trip_updates(&self) -> impl Iterator<Item = &TripUpdate> {
        self.entities.iter().filter_map(|e| match e {
            Entity::TripUpdate(t) => Some(t),
            Entity::Alert(_) => None,
        })
    }

    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.entities.iter().filter_map(|e| match e {
            Entity::Alert(a) => Some(a),
            Entity::TripUpdate(_) => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    TripUpdate(TripUpdate),
    Alert(Alert),
}

/// Realtime predictions for one trip. Missing identifiers decode as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripUpdate {
    pub trip_id: String,
    pub route_id: String,
    pub stop_time_updates: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopTimeUpdate {
    pub stop_id: String,
    /// Predicted arrival in POSIX seconds, exactly as carried on the wire.
    pub arrival_epoch_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alert {
    pub active_periods: Vec<TimeWindow>,
    pub informed_entities: Vec<InformedEntity>,
    pub header_translations: Vec<LocalizedText>,
    pub description_translations: Vec<LocalizedText>,
}

/// Activation window of an alert, in POSIX seconds.
///
/// A missing `start` means the window has always been open and a missing
/// `end` means it never closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl TimeWindow {
    /// Returns `true` if `now` lies within `[start, end]`, both bounds inclusive.
    ///
    /// The comparison is done in milliseconds so a window ending at second `T`
    /// is already closed at `T + 0.5s`.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let now_ms = i128::from(now.timestamp_millis());
        let start_ms = self.start.map_or(0, |s| i128::from(s) * 1000);
        let started = start_ms <= now_ms;
        let not_ended = self.end.is_none_or(|e| now_ms <= i128::from(e) * 1000);
        started && not_ended
    }
}

/// Scope selector of an alert. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InformedEntity {
    pub agency_id: Option<String>,
    pub route_id: Option<String>,
    pub stop_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    pub language: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const T: u64 = 1_700_000_000;

    fn at(secs: u64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs as i64, 0).unwrap()
    }

    #[test]
    fn test_window_around_now_is_active() {
        let w = TimeWindow {
            start: Some(T - 10),
            end: Some(T + 10),
        };
        assert!(w.contains(at(T)));
    }

    #[test]
    fn test_window_starting_later_is_inactive() {
        let w = TimeWindow {
            start: Some(T + 1),
            end: None,
        };
        assert!(!w.contains(at(T)));
    }

    #[test]
    fn test_window_without_start_but_expired_is_inactive() {
        let w = TimeWindow {
            start: None,
            end: Some(T - 1),
        };
        assert!(!w.contains(at(T)));
    }

    #[test]
    fn test_open_ended_window_is_active() {
        let w = TimeWindow {
            start: Some(T - 100),
            end: None,
        };
        assert!(w.contains(at(T)));
    }

    #[test]
    fn test_window_bounds_are_inclusive() {
        let w = TimeWindow {
            start: Some(T),
            end: Some(T),
        };
        assert!(w.contains(at(T)));
        assert!(!w.contains(Utc.timestamp_millis_opt(T as i64 * 1000 + 500).unwrap()));
    }

    #[test]
    fn test_unbounded_window_is_always_active() {
        assert!(TimeWindow::default().contains(at(0)));
        assert!(TimeWindow::default().contains(at(u32::MAX as u64)));
    }

    #[test]
    fn test_entity_iterators_split_by_kind() {
        let feed = FeedMessage {
            entities: vec![
                Entity::Alert(Alert::default()),
                Entity::TripUpdate(TripUpdate::default()),
                Entity::TripUpdate(TripUpdate::default()),
            ],
        };
        assert_eq!(feed.trip_updates().count(), 2);
        assert_eq!(feed.alerts().count(), 1);
    }
}
