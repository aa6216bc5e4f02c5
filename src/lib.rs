//! Next arrivals and service alerts for a route and stop, read from GTFS
//! Realtime trip-update and alert feeds.

pub mod alerts;
pub mod arrivals;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod model;
pub mod output;
pub mod parser;
pub mod routes;

pub mod gtfs_rt {
    include!(concat!(env!("OUT_DIR"), "/transit_realtime.rs"));
}

pub use engine::{FeedQueryEngine, Query, QueryResponse};
pub use error::QueryError;
