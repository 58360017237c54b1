use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::errors::CoreError;

/// Moves one query to the backend and returns the decoded JSON body.
///
/// This is the only seam that touches the network, so tests swap in a
/// scripted implementation and the rest of the client is unaware of HTTP.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable name (for logs).
    fn name(&self) -> &str;

    /// Issue a GET to `url` with `query` and decode the JSON response.
    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Value, CoreError>;
}

/// Plain HTTP GET transport.
///
/// The backend web app answers with JSON and allows cross-origin reads, so no
/// callback wrapping is involved; the request is bounded by the client timeout.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn fetch(&self, url: &str, query: &[(String, String)]) -> Result<Value, CoreError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?;

        resp.json::<Value>()
            .await
            .map_err(|e| CoreError::Deserialization(format!("Backend returned invalid JSON: {e}")))
    }
}
