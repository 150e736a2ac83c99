//! Runner error types.

use thiserror::Error;

/// Errors that end a run before it does any work, or while it exports.
#[derive(Debug, Error)]
pub enum RunError {
    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(#[from] common::ConfigError),

    /// Missing or empty credentials.
    #[error("credentials error: {0}")]
    Auth(#[from] auth::AuthError),

    /// CMDB client could not be built or a request failed.
    #[error("CMDB error: {0}")]
    Cmdb(#[from] cmdb_rest::CmdbRestError),

    /// The crawl could not start.
    #[error("crawl error: {0}")]
    Crawl(#[from] crawler::CrawlError),

    /// Writing results failed.
    #[error("export error: {0}")]
    Export(#[from] crawler::ExportError),
}
