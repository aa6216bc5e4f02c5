//! Error types surfaced by feed decoding and queries.
//!
//! Every variant of [`QueryError`] is terminal: a failed query never returns
//! partial results.

use reqwest::StatusCode;
use thiserror::Error;

/// The bytes did not conform to the GTFS Realtime wire schema.
#[derive(Debug, Error)]
pub enum MalformedFeed {
    #[error("malformed GTFS-RT payload: {0}")]
    Decode(#[from] prost::DecodeError),

    /// The required `FeedMessage.header` was absent. prost does not enforce
    /// proto2 `required`, so this is checked after decoding.
    #[error("GTFS-RT payload has no feed header")]
    MissingHeader,
}

#[derive(Debug, Error)]
pub enum QueryError {
    /// A required query parameter was missing or not understood.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Fetching a feed failed, either at the transport level or with a
    /// non-success status.
    #[error("feed unavailable at {url}: {reason}")]
    FeedUnavailable { url: String, reason: String },

    /// A feed was fetched but could not be decoded.
    #[error("feed from {url} could not be decoded")]
    MalformedFeed {
        url: String,
        #[source]
        source: MalformedFeed,
    },
}

impl QueryError {
    /// HTTP status an outer handler should answer with.
    pub fn status(&self) -> StatusCode {
        match self {
            QueryError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            QueryError::FeedUnavailable { .. } => StatusCode::BAD_GATEWAY,
            QueryError::MalformedFeed { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable tag for logs and CSV records.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidRequest(_) => "invalid_request",
            QueryError::FeedUnavailable { .. } => "feed_unavailable",
            QueryError::MalformedFeed { .. } => "malformed_feed",
        }
    }
}
