//! REST client for the hosted realtime database.
//!
//! Every node of the database tree is addressable as
//! `{database_url}/{path}.json`; authenticated requests carry the user's ID
//! token in the `auth` query parameter.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::{RemoteStore, StorageError};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Realtime database client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct RealtimeDbClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

#[derive(Clone, Copy, Debug)]
enum Method {
    Get,
    Put,
    Delete,
}

impl RealtimeDbClient {
    pub fn new(database_url: &str) -> Result<Self, StorageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: database_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Create a new client with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response, StorageError> {
        let url = self.node_url(path);
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let mut request = match method {
                Method::Get => self.client.get(&url),
                Method::Put => self.client.put(&url),
                Method::Delete => self.client.delete(&url),
            };
            if let Some(ref token) = self.token {
                request = request.query(&[("auth", token)]);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = request.send().await?;
            let status = response.status();

            if status.is_success() {
                debug!(?method, path, %status, "Remote request complete");
                return Ok(response);
            }

            if status.as_u16() == 429 {
                retries += 1;
                if retries > MAX_RATE_LIMIT_RETRIES {
                    return Err(StorageError::RateLimited);
                }
                warn!(path, retry = retries, backoff_ms, "Rate limited, backing off");
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms *= 2;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::from_status(status, &body));
        }
    }
}

#[async_trait]
impl RemoteStore for RealtimeDbClient {
    async fn read_all(&self, path: &str) -> Result<Value, StorageError> {
        let response = self.send(Method::Get, path, None).await?;
        response
            .json()
            .await
            .map_err(|e| StorageError::InvalidResponse(format!("Failed to parse {}: {}", path, e)))
    }

    async fn write_all(&self, path: &str, tree: &Value) -> Result<(), StorageError> {
        self.send(Method::Put, path, Some(tree)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), StorageError> {
        self.send(Method::Delete, path, None).await?;
        Ok(())
    }
}
