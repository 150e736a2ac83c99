//! CMDB REST API client.
//!
//! This crate provides a typed client for the CMDB REST API with:
//!
//! - **Request signing**: every request carries `_key` and `_secret`
//! - **Service-tree endpoints**: relation views, CI search, relation search
//!   and statistics
//! - **Raw access**: signed GET returning status, URL and JSON for probing
//! - **Error handling**: typed errors with the server's `message`
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::ApiCredentials;
//! use cmdb_rest::{CmdbApi, CmdbRestClient};
//! use common::CmdbEnvironment;
//!
//! let credentials = ApiCredentials::from_env()?;
//! let client = CmdbRestClient::new(credentials, CmdbEnvironment::from_env()?)?;
//!
//! let views = client.get_relation_views().await?;
//! for name in views.views.keys() {
//!     println!("{name}");
//! }
//! ```

mod api;
mod client;
mod error;

pub use api::CmdbApi;
pub use client::{normalize_params, CmdbRestClient};
pub use error::CmdbRestError;
