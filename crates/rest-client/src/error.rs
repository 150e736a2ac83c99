//! REST client error types.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during REST API calls.
#[derive(Debug, Error)]
pub enum RestError {
    /// Non-2xx status; `message` is the raw response body.
    #[error("HTTP error: {status} - {message}")]
    HttpError { status: u16, message: String },

    /// Request timed out.
    #[error("Request timeout")]
    Timeout,

    /// Connection error (DNS, TLS, refused).
    #[error("Connection error: {0}")]
    Connection(String),

    /// Response body is not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(String),

    /// HTTP 429, with the server's `Retry-After` when it sent one.
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    /// The HTTP client could not be built.
    #[error("Request build error: {0}")]
    RequestBuild(String),

    /// The base URL and path do not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for RestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RestError::Timeout
        } else if err.is_decode() {
            RestError::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            RestError::HttpError {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            RestError::Connection(err.to_string())
        }
    }
}
