//! Protobuf decoder for GTFS Realtime feeds.
//!
//! [`parse_feed`] yields the raw generated message; [`decode_feed`] projects it
//! into the typed [`model`](crate::model) used by the extractors.

use prost::Message;
use tracing::debug;

use crate::error::MalformedFeed;
use crate::gtfs_rt;
use crate::model::{
    Alert, Entity, FeedMessage, InformedEntity, LocalizedText, StopTimeUpdate, TimeWindow,
    TripUpdate,
};

/// Decodes a protobuf-encoded GTFS-RT [`gtfs_rt::FeedMessage`] from raw bytes.
///
/// # Errors
///
/// Returns [`MalformedFeed`] if the bytes are not valid protobuf for a
/// `FeedMessage`, or if the required header is missing (which includes an
/// empty payload).
pub fn parse_feed(bytes: &[u8]) -> Result<gtfs_rt::FeedMessage, MalformedFeed> {
    let feed = gtfs_rt::FeedMessage::decode(bytes)?;

    // gtfs_realtime_version is required inside the header, so it is only
    // empty when the header itself was never on the wire.
    if feed.header.gtfs_realtime_version.is_empty() {
        return Err(MalformedFeed::MissingHeader);
    }
    Ok(feed)
}

/// Decodes raw bytes and keeps only the trip update and alert entities.
///
/// Vehicle positions and any other entity kinds are skipped without error.
pub fn decode_feed(bytes: &[u8]) -> Result<FeedMessage, MalformedFeed> {
    let raw = parse_feed(bytes)?;
    let total = raw.entity.len();

    let entities: Vec<Entity> = raw.entity.into_iter().filter_map(project_entity).collect();

    debug!(
        total,
        kept = entities.len(),
        skipped = total - entities.len(),
        "Feed decoded"
    );

    Ok(FeedMessage { entities })
}

fn project_entity(entity: gtfs_rt::FeedEntity) -> Option<Entity> {
    if let Some(trip_update) = entity.trip_update {
        Some(Entity::TripUpdate(trip_update.into()))
    } else {
        entity.alert.map(|alert| Entity::Alert(alert.into()))
    }
}

impl From<gtfs_rt::TripUpdate> for TripUpdate {
    fn from(tu: gtfs_rt::TripUpdate) -> Self {
        TripUpdate {
            trip_id: tu.trip.trip_id.unwrap_or_default(),
            route_id: tu.trip.route_id.unwrap_or_default(),
            stop_time_updates: tu
                .stop_time_update
                .into_iter()
                .map(|stu| StopTimeUpdate {
                    stop_id: stu.stop_id.unwrap_or_default(),
                    arrival_epoch_seconds: stu.arrival.and_then(|event| event.time),
                })
                .collect(),
        }
    }
}

impl From<gtfs_rt::Alert> for Alert {
    fn from(alert: gtfs_rt::Alert) -> Self {
        Alert {
            active_periods: alert
                .active_period
                .into_iter()
                .map(|range| TimeWindow {
                    start: range.start,
                    end: range.end,
                })
                .collect(),
            informed_entities: alert
                .informed_entity
                .into_iter()
                .map(|selector| InformedEntity {
                    agency_id: selector.agency_id,
                    route_id: selector.route_id,
                    stop_id: selector.stop_id,
                })
                .collect(),
            header_translations: translations(alert.header_text),
            description_translations: translations(alert.description_text),
        }
    }
}

fn translations(text: Option<gtfs_rt::TranslatedString>) -> Vec<LocalizedText> {
    text.map(|t| t.translation)
        .unwrap_or_default()
        .into_iter()
        .map(|tr| LocalizedText {
            language: tr.language.unwrap_or_default(),
            text: tr.text,
        })
        .collect()
}
