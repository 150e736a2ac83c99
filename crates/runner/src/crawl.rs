//! `crawl` mode: fetch service trees and write them to disk.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use cmdb_rest::CmdbRestClient;
use common::CrawlSettings;
use crawler::{CrawlerConfig, ExportError, Exporter, ServiceTreeCrawler};
use metrics::SharedMetrics;
use model::ServiceTreeData;

use crate::error::RunError;

/// Directory for generated export names.
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_FILE_PREFIX: &str = "service_trees";

/// Crawl `views` (all when empty), export, and print a summary.
pub async fn run_crawl(
    client: CmdbRestClient,
    settings: &CrawlSettings,
    views: &[String],
    metrics: SharedMetrics,
) -> Result<(), RunError> {
    let crawler = ServiceTreeCrawler::new(Arc::new(client), CrawlerConfig::from(settings))
        .with_metrics(metrics);

    let trees = crawler.crawl_specific_views(views).await?;

    if trees.is_empty() {
        warn!("No service tree data found");
        return Ok(());
    }

    for path in export_results(&trees, settings)? {
        println!("Written: {}", path.display());
    }
    print!("{}", format_summary(&trees));

    Ok(())
}

/// Export path: the configured one, else `output/service_trees_<ts>.<ext>`.
pub fn output_path(settings: &CrawlSettings, exporter: &Exporter) -> PathBuf {
    match &settings.output_path {
        Some(path) => PathBuf::from(path),
        None => Path::new(DEFAULT_OUTPUT_DIR)
            .join(exporter.generate_file_name(DEFAULT_FILE_PREFIX, true)),
    }
}

/// Write the trees and their summary, returning the files written.
///
/// With `summary_only` only the summary is written. Otherwise a failing
/// summary is logged and the full export still counts.
pub fn export_results(
    trees: &[ServiceTreeData],
    settings: &CrawlSettings,
) -> Result<Vec<PathBuf>, ExportError> {
    let exporter = Exporter::from_settings(settings);
    let path = output_path(settings, &exporter);
    let summary = exporter.summary_path(&path);

    if settings.summary_only {
        exporter.export_summary(trees, &summary)?;
        return Ok(vec![summary]);
    }

    exporter.export_service_trees(trees, &path)?;
    let mut written = vec![path];

    match exporter.export_summary(trees, &summary) {
        Ok(()) => written.push(summary),
        Err(e) => warn!(error = %e, "Failed to write summary file"),
    }

    Ok(written)
}

/// Human-readable totals per tree and overall.
pub fn format_summary(trees: &[ServiceTreeData]) -> String {
    let mut out = String::new();
    let total_nodes: usize = trees.iter().map(|t| t.total_nodes).sum();
    let max_depth = trees.iter().map(|t| t.max_depth).max().unwrap_or(0);

    let _ = writeln!(out, "\n=== Crawl Summary ===");
    let _ = writeln!(out, "Trees:               {}", trees.len());

    for tree in trees {
        let view_id = tree
            .view_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let _ = writeln!(out, "\n{} (id {})", tree.view_name, view_id);
        let _ = writeln!(out, "  Roots:             {}", tree.root_nodes.len());
        let _ = writeln!(out, "  Nodes:             {}", tree.total_nodes);
        let _ = writeln!(out, "  Max depth:         {}", tree.max_depth);
        let _ = writeln!(out, "  Public:            {}", tree.config.is_public);
        let _ = writeln!(
            out,
            "  Crawled at:        {}",
            tree.crawled_at.format("%Y-%m-%d %H:%M:%S")
        );
        if !tree.config.show_types.is_empty() {
            let names: Vec<&str> = tree
                .config
                .show_types
                .iter()
                .map(|t| t.display_name())
                .collect();
            let _ = writeln!(out, "  Leaf types:        {}", names.join(", "));
        }
    }

    let _ = writeln!(out, "\nTotal nodes:         {}", total_nodes);
    let _ = writeln!(out, "Max depth:           {}", max_depth);

    info!(
        trees = trees.len(),
        total_nodes = total_nodes,
        max_depth = max_depth,
        "Crawl complete"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::OutputFormat;
    use model::{CiType, ServiceTreeNode, ServiceTreeView};
    use tempfile::TempDir;

    fn tree(name: &str, view_id: Option<i64>) -> ServiceTreeData {
        let mut root = ServiceTreeNode {
            id: 1,
            name: "payments".into(),
            ..Default::default()
        };
        root.add_child(ServiceTreeNode {
            id: 2,
            name: "checkout".into(),
            ..Default::default()
        });

        let view = ServiceTreeView {
            show_types: vec![CiType {
                id: 41,
                name: "server".into(),
                alias: "Server".into(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let mut tree = ServiceTreeData::new(name, view_id, view);
        tree.root_nodes = vec![root];
        tree.count_nodes();
        tree.calculate_max_depth();
        tree
    }

    fn settings(dir: &TempDir, file: &str) -> CrawlSettings {
        CrawlSettings {
            output_path: Some(dir.path().join(file).to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_output_path_generated() {
        let settings = CrawlSettings {
            output_format: OutputFormat::Csv,
            ..Default::default()
        };
        let exporter = Exporter::from_settings(&settings);
        let path = output_path(&settings, &exporter);

        assert!(path.starts_with("output"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("service_trees_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn test_output_path_configured() {
        let settings = CrawlSettings {
            output_path: Some("data/trees.json".into()),
            ..Default::default()
        };
        let exporter = Exporter::from_settings(&settings);
        assert_eq!(output_path(&settings, &exporter), PathBuf::from("data/trees.json"));
    }

    #[test]
    fn test_export_results_writes_tree_and_summary() {
        let dir = TempDir::new().unwrap();
        let settings = settings(&dir, "trees.json");

        let written = export_results(&[tree("Business", Some(3))], &settings).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("trees.json"));
        assert!(written[1].ends_with("trees_summary.json"));
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_export_results_summary_only() {
        let dir = TempDir::new().unwrap();
        let settings = CrawlSettings {
            summary_only: true,
            ..settings(&dir, "trees.csv")
        };

        let written = export_results(&[tree("Business", Some(3))], &settings).unwrap();

        assert_eq!(written.len(), 1);
        assert!(written[0].ends_with("trees_summary.json"));
        assert!(!dir.path().join("trees.csv").exists());
    }

    #[test]
    fn test_export_results_yaml() {
        let dir = TempDir::new().unwrap();
        let settings = CrawlSettings {
            output_format: OutputFormat::Yaml,
            ..settings(&dir, "trees.yaml")
        };

        let written = export_results(&[tree("Business", Some(3))], &settings).unwrap();

        assert_eq!(written.len(), 2);
        assert!(written[0].ends_with("trees.yaml"));
        assert!(written[1].ends_with("trees_summary.yaml"));
        assert!(written.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_format_summary() {
        let text = format_summary(&[tree("Business", Some(3)), tree("Ops", None)]);

        assert!(text.contains("Trees:               2"));
        assert!(text.contains("Business (id 3)"));
        assert!(text.contains("Ops (id unknown)"));
        assert!(text.contains("Leaf types:        Server"));
        assert!(text.contains("Total nodes:         4"));
        assert!(text.contains("Max depth:           2"));
    }
}
