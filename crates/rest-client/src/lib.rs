//! Generic REST client infrastructure.
//!
//! This crate provides a thin wrapper around `reqwest` with:
//!
//! - Consistent error handling via `RestError`
//! - GET requests with encoded query pairs
//! - JSON response deserialization, typed or raw
//! - Access to status code and resolved URL for diagnostics
//! - Rate limit detection
//!
//! # Example
//!
//! ```rust,ignore
//! use rest_client::RestClient;
//!
//! let client = RestClient::with_default_timeout("https://cmdb.veops.cn")?;
//! let query = vec![("count".to_string(), "10".to_string())];
//! let response = client.get_response("/api/v0.1/ci/s", &query).await?;
//! println!("{} {}", response.status, response.url);
//! ```

mod client;
mod error;

pub use client::{RestClient, RestResponse};
pub use error::RestError;
