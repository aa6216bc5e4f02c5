//! Identifier canonicalization for alert matching.
//!
//! Alerts are scoped to a stop regardless of direction and to a route
//! regardless of zero padding. Arrival lookups do not go through here: they
//! compare identifiers exactly.

const DIRECTION_MARKERS: [char; 4] = ['N', 'S', 'E', 'W'];

fn is_direction(c: char) -> bool {
    DIRECTION_MARKERS.contains(&c)
}

/// Strips a trailing direction marker (`N`, `S`, `E`, `W`) from a stop id.
///
/// `"101N"` becomes `"101"`. Only one marker is ever removed, and only when the
/// character before it is not itself a marker, so the result never ends in a
/// strippable marker and normalizing twice gives the same id.
pub fn normalize_stop(id: &str) -> &str {
    let mut chars = id.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(last), prev) if is_direction(last) && !prev.is_some_and(is_direction) => {
            &id[..id.len() - last.len_utf8()]
        }
        _ => id,
    }
}

/// Strips every leading `0` from a route id: `"006"` becomes `"6"`.
pub fn normalize_route(id: &str) -> &str {
    id.trim_start_matches('0')
}
