//! CMDB server configuration.
//!
//! Points the clients at a CMDB instance. Defaults target the public demo
//! server.

use crate::error::ConfigError;
use std::fmt;
use std::time::Duration;

/// Public demo instance.
pub const DEFAULT_BASE_URL: &str = "https://cmdb.veops.cn";

/// API path prefix.
pub const DEFAULT_API_VERSION: &str = "api/v0.1";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where and how to reach the CMDB API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdbEnvironment {
    base_url: String,
    api_version: String,
    timeout: Duration,
}

impl Default for CmdbEnvironment {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL, DEFAULT_API_VERSION)
    }
}

impl CmdbEnvironment {
    /// Create an environment for the given server root and API prefix.
    ///
    /// Trailing slashes on `base_url` and surrounding slashes on
    /// `api_version` are stripped.
    pub fn new(base_url: &str, api_version: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version: api_version.trim_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Server root, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// API prefix, without surrounding slashes.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Path, relative to the server root, of an endpoint below the API prefix.
    ///
    /// `endpoint` may or may not start with a slash.
    pub fn endpoint_path(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if self.api_version.is_empty() {
            format!("/{}", endpoint)
        } else {
            format!("/{}/{}", self.api_version, endpoint)
        }
    }

    /// Load from `CMDB_BASE_URL`, `CMDB_API_VERSION` and `CMDB_TIMEOUT_SECS`.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        crate::load_dotenv();
        Self::from_lookup(crate::process_env)
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("CMDB_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_version =
            lookup("CMDB_API_VERSION").unwrap_or_else(|| DEFAULT_API_VERSION.to_string());

        let mut env = Self::new(&base_url, &api_version);

        if let Some(raw) = lookup("CMDB_TIMEOUT_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("CMDB_TIMEOUT_SECS", &raw, "whole seconds"))?;
            if secs == 0 {
                return Err(ConfigError::invalid(
                    "CMDB_TIMEOUT_SECS",
                    &raw,
                    "must be greater than zero",
                ));
            }
            env = env.with_timeout(Duration::from_secs(secs));
        }

        Ok(env)
    }
}

impl fmt::Display for CmdbEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_url, self.api_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_points_at_demo() {
        let env = CmdbEnvironment::default();
        assert_eq!(env.base_url(), "https://cmdb.veops.cn");
        assert_eq!(env.api_version(), "api/v0.1");
        assert_eq!(env.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_endpoint_path() {
        let env = CmdbEnvironment::default();
        assert_eq!(env.endpoint_path("ci/s"), "/api/v0.1/ci/s");
        assert_eq!(env.endpoint_path("/ci_types"), "/api/v0.1/ci_types");
        assert_eq!(
            env.endpoint_path("/preference/relation/view"),
            "/api/v0.1/preference/relation/view"
        );
    }

    #[test]
    fn test_new_strips_slashes() {
        let env = CmdbEnvironment::new("http://localhost:5000/", "/api/v0.1/");
        assert_eq!(env.base_url(), "http://localhost:5000");
        assert_eq!(env.endpoint_path("ci_types"), "/api/v0.1/ci_types");
    }

    #[test]
    fn test_empty_api_version() {
        let env = CmdbEnvironment::new("http://localhost", "");
        assert_eq!(env.endpoint_path("/api/v0.1/ci/s"), "/api/v0.1/ci/s");
    }

    #[test]
    fn test_from_lookup_defaults() {
        let env = CmdbEnvironment::from_lookup(lookup(&[])).unwrap();
        assert_eq!(env, CmdbEnvironment::default());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let env = CmdbEnvironment::from_lookup(lookup(&[
            ("CMDB_BASE_URL", "http://cmdb.internal"),
            ("CMDB_API_VERSION", "api/v1"),
            ("CMDB_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(env.base_url(), "http://cmdb.internal");
        assert_eq!(env.api_version(), "api/v1");
        assert_eq!(env.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_from_lookup_rejects_bad_timeout() {
        assert!(CmdbEnvironment::from_lookup(lookup(&[("CMDB_TIMEOUT_SECS", "soon")])).is_err());
        assert!(CmdbEnvironment::from_lookup(lookup(&[("CMDB_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            CmdbEnvironment::default().to_string(),
            "https://cmdb.veops.cn/api/v0.1"
        );
    }
}
