//! Crawler and exporter error types.

use cmdb_rest::CmdbRestError;
use thiserror::Error;

/// Errors that can occur while crawling service trees.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// CMDB request failed.
    #[error("CMDB API error: {0}")]
    Api(#[from] CmdbRestError),

    /// The view defines no levels.
    #[error("service tree '{0}' has no levels defined")]
    NoLevels(String),

    /// A subtree task panicked or was cancelled.
    #[error("crawl task failed: {0}")]
    TaskFailed(String),
}

/// Errors that can occur while writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    /// File system error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding failed.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// CSV encoding failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
