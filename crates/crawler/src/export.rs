//! Writing crawled trees to disk.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use common::{CrawlSettings, OutputFormat};
use model::{ServiceTreeData, ServiceTreeNode};

use crate::error::ExportError;

/// Version stamped into every export document.
pub const EXPORT_VERSION: &str = "1.0";

const CSV_HEADERS: [&str; 11] = [
    "view_name",
    "view_id",
    "node_id",
    "node_type",
    "node_type_name",
    "node_name",
    "node_path",
    "level",
    "is_leaf",
    "child_count",
    "parent_id",
];

/// Header of every export document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub format: String,
    pub version: String,
    pub tree_count: usize,
    pub total_nodes: usize,
}

impl ExportMetadata {
    fn new(format: OutputFormat, trees: &[ServiceTreeData]) -> Self {
        Self {
            exported_at: Utc::now(),
            format: format.to_string(),
            version: EXPORT_VERSION.to_string(),
            tree_count: trees.len(),
            total_nodes: trees.iter().map(|t| t.total_nodes).sum(),
        }
    }
}

/// One line of the summary file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceTreeSummary {
    pub view_name: String,
    pub view_id: Option<i64>,
    pub root_count: usize,
    pub total_nodes: usize,
    pub max_depth: usize,
    pub crawled_at: DateTime<Utc>,
    pub is_public: bool,
    pub leaf_types: Vec<String>,
}

impl From<&ServiceTreeData> for ServiceTreeSummary {
    fn from(tree: &ServiceTreeData) -> Self {
        Self {
            view_name: tree.view_name.clone(),
            view_id: tree.view_id,
            root_count: tree.root_nodes.len(),
            total_nodes: tree.total_nodes,
            max_depth: tree.max_depth,
            crawled_at: tree.crawled_at,
            is_public: tree.config.is_public,
            leaf_types: tree.config.show_types.iter().map(|t| t.name.clone()).collect(),
        }
    }
}

#[derive(Serialize)]
struct TreeDocument<'a> {
    metadata: ExportMetadata,
    service_trees: &'a [ServiceTreeData],
}

#[derive(Serialize)]
struct SummaryDocument {
    metadata: ExportMetadata,
    summary: Vec<ServiceTreeSummary>,
}

/// Writes crawled trees as JSON, YAML or CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exporter {
    format: OutputFormat,
    pretty: bool,
}

impl Exporter {
    pub fn new(format: OutputFormat, pretty: bool) -> Self {
        Self { format, pretty }
    }

    pub fn from_settings(settings: &CrawlSettings) -> Self {
        Self::new(settings.output_format, settings.pretty)
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write every tree to `path`, creating missing parent directories.
    ///
    /// JSON and YAML carry an [`ExportMetadata`] header; CSV has one row per node.
    pub fn export_service_trees(
        &self,
        trees: &[ServiceTreeData],
        path: &Path,
    ) -> Result<(), ExportError> {
        info!(
            format = %self.format,
            path = %path.display(),
            tree_count = trees.len(),
            "Exporting service trees"
        );

        ensure_parent_dir(path)?;

        match self.format {
            OutputFormat::Json | OutputFormat::Yaml => {
                let document = TreeDocument {
                    metadata: ExportMetadata::new(self.format, trees),
                    service_trees: trees,
                };
                self.write_document(self.format, &document, path)?;
            }
            OutputFormat::Csv => write_csv(trees, path)?,
        }

        info!(path = %path.display(), "Export complete");
        Ok(())
    }

    /// Format of the summary file: YAML for YAML exports, JSON otherwise.
    pub fn summary_format(&self) -> OutputFormat {
        match self.format {
            OutputFormat::Yaml => OutputFormat::Yaml,
            OutputFormat::Json | OutputFormat::Csv => OutputFormat::Json,
        }
    }

    /// Summary file next to an export: `trees.csv` gives `trees_summary.json`,
    /// `trees.yaml` gives `trees_summary.yaml`.
    pub fn summary_path(&self, path: &Path) -> PathBuf {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "service_trees".to_string());
        path.with_file_name(format!(
            "{}_summary.{}",
            stem,
            self.summary_format().extension()
        ))
    }

    /// Write per-tree totals to `path` in [`summary_format`](Self::summary_format).
    pub fn export_summary(
        &self,
        trees: &[ServiceTreeData],
        path: &Path,
    ) -> Result<(), ExportError> {
        ensure_parent_dir(path)?;

        let format = self.summary_format();
        let document = SummaryDocument {
            metadata: ExportMetadata::new(format, trees),
            summary: trees.iter().map(ServiceTreeSummary::from).collect(),
        };
        self.write_document(format, &document, path)?;

        info!(path = %path.display(), "Summary written");
        Ok(())
    }

    /// `prefix.ext`, or `prefix_YYYYMMDD_HHMMSS.ext` with a timestamp.
    pub fn generate_file_name(&self, prefix: &str, timestamp: bool) -> String {
        let stem = if timestamp {
            format!("{}_{}", prefix, Utc::now().format("%Y%m%d_%H%M%S"))
        } else {
            prefix.to_string()
        };
        format!("{}.{}", stem, self.format.extension())
    }

    fn write_document<T: Serialize>(
        &self,
        format: OutputFormat,
        value: &T,
        path: &Path,
    ) -> Result<(), ExportError> {
        let mut writer = BufWriter::new(File::create(path)?);
        match format {
            OutputFormat::Yaml => serde_yaml::to_writer(&mut writer, value)?,
            _ if self.pretty => {
                serde_json::to_writer_pretty(&mut writer, value)?;
                writer.write_all(b"\n")?;
            }
            _ => {
                serde_json::to_writer(&mut writer, value)?;
                writer.write_all(b"\n")?;
            }
        }
        writer.flush()?;
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> Result<(), ExportError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
            info!(dir = %dir.display(), "Created output directory");
        }
    }
    Ok(())
}

fn write_csv(trees: &[ServiceTreeData], path: &Path) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADERS)?;

    for tree in trees {
        let view_id = tree.view_id.map(|id| id.to_string()).unwrap_or_default();
        for root in &tree.root_nodes {
            write_node(&mut writer, &tree.view_name, &view_id, root, None)?;
        }
    }

    writer.flush()?;
    Ok(())
}

fn write_node<W: Write>(
    writer: &mut csv::Writer<W>,
    view_name: &str,
    view_id: &str,
    node: &ServiceTreeNode,
    parent_id: Option<i64>,
) -> Result<(), ExportError> {
    writer.write_record([
        view_name.to_string(),
        view_id.to_string(),
        node.id.to_string(),
        node.ci_type.to_string(),
        node.type_name.clone(),
        node.name.clone(),
        node.tree_path(),
        node.level.to_string(),
        node.is_leaf.to_string(),
        node.child_count.to_string(),
        parent_id.map(|id| id.to_string()).unwrap_or_default(),
    ])?;

    for child in &node.children {
        write_node(writer, view_name, view_id, child, Some(node.id))?;
    }
    Ok(())
}
