//! Generic REST client wrapper around reqwest.

use crate::error::RestError;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("cmdb-probe/", env!("CARGO_PKG_VERSION"));

/// A decoded response together with what the server was asked.
#[derive(Debug, Clone)]
pub struct RestResponse<T> {
    /// HTTP status code.
    pub status: u16,
    /// Final URL including the encoded query string.
    pub url: String,
    /// Decoded body.
    pub body: T,
}

impl<T> RestResponse<T> {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Generic REST client for making HTTP GET requests.
pub struct RestClient {
    client: Client,
    base_url: String,
}

impl RestClient {
    /// Create a new REST client with the given base URL.
    ///
    /// # Arguments
    /// * `base_url` - Base URL for all requests (e.g., "https://cmdb.veops.cn")
    /// * `timeout` - Request timeout duration
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RestError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| RestError::RequestBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new REST client with default timeout.
    pub fn with_default_timeout(base_url: &str) -> Result<Self, RestError> {
        Self::new(base_url, DEFAULT_TIMEOUT)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Path component of the URL a request to `path` would hit.
    ///
    /// Includes any path prefix carried by the base URL, which is what the
    /// server sees and therefore what has to be signed.
    pub fn url_path(&self, path: &str) -> Result<String, RestError> {
        let url = self.build_url(path);
        Url::parse(&url)
            .map(|u| u.path().to_string())
            .map_err(|e| RestError::InvalidUrl(format!("{}: {}", url, e)))
    }

    /// Make a GET request and deserialize a successful JSON body.
    ///
    /// # Arguments
    /// * `path` - Request path (e.g., "/api/v0.1/ci/s")
    /// * `query` - Query pairs, encoded by reqwest
    ///
    /// # Errors
    /// Non-2xx statuses become `RestError::HttpError` (or `RateLimited` for 429).
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, RestError> {
        let response = self.send_get(path, query).await?;
        self.handle_response(response).await
    }

    /// Make a GET request and return status, resolved URL and JSON body.
    ///
    /// Unlike [`get`](Self::get) this does not fail on non-2xx statuses; only
    /// transport errors and non-JSON bodies are errors.
    pub async fn get_response(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<RestResponse<Value>, RestError> {
        let response = self.send_get(path, query).await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let text = response.text().await?;

        let body = serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(status = status, body = %text, error = %e, "Response is not JSON");
            RestError::Parse(e.to_string())
        })?;

        Ok(RestResponse { status, url, body })
    }

    async fn send_get(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<Response, RestError> {
        let url = self.build_url(path);
        tracing::debug!(url = %url, params = query.len(), "GET request");

        let response = self.client.get(&url).query(query).send().await?;
        Ok(response)
    }

    /// Build a full URL from a path.
    fn build_url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url.clone()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Handle HTTP response and deserialize JSON body.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: Response,
    ) -> Result<T, RestError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                tracing::warn!(body = %body, error = %e, "Failed to parse response");
                RestError::Parse(e.to_string())
            })
        } else if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(RestError::RateLimited { retry_after })
        } else {
            let body = response.text().await.unwrap_or_default();

            Err(RestError::HttpError {
                status: status.as_u16(),
                message: body,
            })
        }
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
