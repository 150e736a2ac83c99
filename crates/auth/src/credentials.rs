//! CMDB API credential management.
//!
//! Uses the `secrecy` crate to keep the API secret out of logs and to zero it
//! on drop.

use crate::error::AuthError;
use secrecy::{ExposeSecret, SecretString};

const API_KEY_VAR: &str = "CMDB_API_KEY";
const API_SECRET_VAR: &str = "CMDB_API_SECRET";

/// Public key and secret used to sign CMDB requests.
///
/// Built once and never mutated afterwards. The secret is wrapped in
/// `SecretString` and is redacted from `Debug` output.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret: SecretString,
}

impl ApiCredentials {
    /// Load credentials from environment variables.
    ///
    /// Looks for:
    /// - `CMDB_API_KEY` - The public key sent as `_key`
    /// - `CMDB_API_SECRET` - The secret mixed into every signature
    ///
    /// # Errors
    /// Returns `AuthError::MissingEnvVar` if either variable is not set and
    /// `AuthError::EmptyCredential` if either is set to an empty string.
    pub fn from_env() -> Result<Self, AuthError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenvy::dotenv().ok();

        let api_key = read_var(API_KEY_VAR)?;
        let secret = read_var(API_SECRET_VAR)?;

        Ok(Self::new(api_key, secret))
    }

    /// Create credentials from explicit values.
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// Get the API key (public, safe to log).
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Expose the secret for signing.
    ///
    /// **WARNING**: Only use this to build a signature.
    /// Never log or display the return value.
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

fn read_var(name: &str) -> Result<String, AuthError> {
    let value = std::env::var(name).map_err(|_| AuthError::MissingEnvVar(name.into()))?;
    if value.trim().is_empty() {
        return Err(AuthError::EmptyCredential(name.into()));
    }
    Ok(value)
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_new() {
        let creds = ApiCredentials::new("d0a8fb5a", "S3cr3t");
        assert_eq!(creds.api_key(), "d0a8fb5a");
        assert_eq!(creds.expose_secret(), "S3cr3t");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = ApiCredentials::new("public_key", "DSGYH81jqfw~%A&vgyJKX");
        let debug_str = format!("{:?}", creds);

        assert!(debug_str.contains("public_key"));
        assert!(!debug_str.contains("DSGYH81jqfw"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_clone_keeps_secret() {
        let creds = ApiCredentials::new("k", "s");
        let cloned = creds.clone();
        assert_eq!(cloned.expose_secret(), "s");
    }
}
