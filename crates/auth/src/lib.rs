//! Credentials and request signing for the CMDB API.
//!
//! Every CMDB request carries two extra query parameters:
//!
//! - `_key`: the public API key
//! - `_secret`: lowercase hex SHA-1 of `path + secret + values`, where
//!   `values` is the concatenation of every scalar parameter value in
//!   key order
//!
//! # Features
//!
//! - **Secure Credentials**: the API secret is wrapped in `SecretString` so it
//!   never shows up in `Debug` output or logs.
//! - **Pure Signing**: `RequestSigner::sign` returns a new parameter map and
//!   leaves the caller's map untouched.
//! - **Observability Hook**: an optional callback receives a redacted trace of
//!   every signature.
//!
//! # Example
//!
//! ```rust,ignore
//! use auth::{ApiCredentials, Params, RequestSigner};
//! use serde_json::json;
//!
//! let credentials = ApiCredentials::from_env()?;
//! let signer = RequestSigner::new(credentials);
//!
//! let mut params = Params::new();
//! params.insert("count".into(), json!(10));
//!
//! let signed = signer.sign("/api/v0.1/ci/s", &params);
//! assert!(signed.contains_key("_secret"));
//! ```

mod credentials;
mod error;
mod params;
mod signer;

pub use credentials::ApiCredentials;
pub use error::AuthError;
pub use params::{scalar_text, to_query_pairs, Params, KEY_PARAM, SECRET_PARAM};
pub use signer::{RequestSigner, SignatureHook, SignatureTrace};
