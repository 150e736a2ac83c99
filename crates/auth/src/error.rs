use thiserror::Error;

/// Errors that can occur while loading CMDB credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// A credential value is present but empty.
    #[error("Empty credential value: {0}")]
    EmptyCredential(String),
}
