//! Raw feed retrieval.
//!
//! [`HttpClient`] is the transport seam; [`FeedSource`] is what the query
//! engine consumes. Every `HttpClient` is a `FeedSource`.

mod api_key;
mod basic;
mod client;

pub use api_key::ApiKey;
pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Something that can hand back the raw, still-encoded bytes behind a feed URL.
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes>;
}

#[async_trait]
impl<C: HttpClient> FeedSource for C {
    async fn fetch_bytes(&self, url: &str) -> Result<Bytes> {
        fetch_bytes(self, url).await
    }
}

/// GETs `url` through `client` and returns the body.
///
/// # Errors
///
/// Fails on an unparseable URL, a transport error, or a non-success status.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Bytes> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?)
}
