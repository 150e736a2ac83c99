//! CMDB REST API error types.

use rest_client::RestError;
use thiserror::Error;

/// Errors that can occur when interacting with the CMDB REST API.
#[derive(Debug, Error)]
pub enum CmdbRestError {
    /// REST client error (network, timeout, etc.).
    #[error("REST client error: {0}")]
    Rest(#[from] RestError),

    /// The CMDB answered with a non-2xx status.
    #[error("CMDB API error {status}: {message}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// `message` from the error body, or the raw body.
        message: String,
    },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

impl CmdbRestError {
    /// Build an API error from a non-2xx response body.
    ///
    /// The CMDB returns errors as `{"message": "..."}`; other bodies are
    /// kept verbatim.
    pub fn from_api_response(status: u16, body: &str) -> Self {
        #[derive(serde::Deserialize)]
        struct ApiError {
            message: String,
        }

        let message = serde_json::from_str::<ApiError>(body)
            .map(|e| e.message)
            .unwrap_or_else(|_| body.to_string());

        Self::ApiError { status, message }
    }

    /// True when the server rejected the key or signature.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::ApiError { status: 401 | 403, .. })
    }
}

/// Lift non-2xx HTTP errors into `ApiError`, keep the rest as REST errors.
pub(crate) fn classify(err: RestError) -> CmdbRestError {
    match err {
        RestError::HttpError { status, message } => {
            CmdbRestError::from_api_response(status, &message)
        }
        other => CmdbRestError::Rest(other),
    }
}
