//! Service-tree crawler.
//!
//! Walks the relation views of a CMDB level by level, building one node tree
//! per view, and writes the result as JSON, YAML or CSV.
//!
//! # Example
//!
//! ```rust,ignore
//! use crawler::{CrawlerConfig, Exporter, ServiceTreeCrawler};
//! use std::sync::Arc;
//!
//! let crawler = ServiceTreeCrawler::new(Arc::new(client), CrawlerConfig::default());
//! let trees = crawler.crawl_all().await?;
//!
//! let exporter = Exporter::from_settings(&settings);
//! exporter.export_service_trees(&trees, Path::new("output/trees.json"))?;
//! ```

mod crawler;
mod error;
mod export;

pub use crawler::{CrawlerConfig, ServiceTreeCrawler};
pub use error::{CrawlError, ExportError};
pub use export::{ExportMetadata, Exporter, ServiceTreeSummary, EXPORT_VERSION};
