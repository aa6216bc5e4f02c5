use std::time::Duration;

use super::client::HttpClient;
use async_trait::async_trait;

/// Plain `reqwest` client with no authentication.
#[derive(Debug, Clone, Default)]
pub struct BasicClient(reqwest::Client);

impl BasicClient {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }

    /// Client with a connect timeout. The overall request deadline is left to
    /// the caller.
    pub fn with_connect_timeout(timeout: Duration) -> reqwest::Result<Self> {
        Ok(Self(
            reqwest::Client::builder().connect_timeout(timeout).build()?,
        ))
    }
}

#[async_trait]
impl HttpClient for BasicClient {
    async fn execute(&self, req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        self.0.execute(req).await
    }
}
