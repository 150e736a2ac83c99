mod crawl;
mod error;
mod probe;

use auth::{ApiCredentials, RequestSigner};
use clap::{Args, Parser, Subcommand};
use cmdb_rest::CmdbRestClient;
use common::{CmdbEnvironment, CrawlSettings, OutputFormat};
use metrics::{create_metrics, SharedMetrics};
use tracing::{error, info};

use crate::error::RunError;

/// Signed CMDB API probe and service-tree crawler
#[derive(Parser, Debug)]
#[command(name = "cmdb-probe")]
#[command(about = "Send signed requests to a CMDB and crawl its service trees")]
#[command(version)]
struct Cli {
    /// Subcommand to run; `probe` when omitted
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Command {
    /// Send the fixed diagnostic requests and print a summary of each
    Probe,
    /// Crawl service trees and export them
    Crawl(CrawlArgs),
}

/// Crawl options. Each one given overrides the matching `CMDB_*` variable.
#[derive(Args, Debug, Default, PartialEq)]
struct CrawlArgs {
    /// View names to crawl; all views when none are given
    #[arg(value_name = "VIEW")]
    view_names: Vec<String>,

    /// View names to crawl, comma separated
    #[arg(long, value_delimiter = ',')]
    views: Vec<String>,

    /// Output file path
    #[arg(short, long)]
    output: Option<String>,

    /// Output format (json, yaml, csv)
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Deepest level to crawl, zero or negative for no limit
    #[arg(long, allow_negative_numbers = true)]
    max_depth: Option<i64>,

    /// Root subtrees crawled at the same time
    #[arg(long)]
    max_workers: Option<usize>,

    /// Fetch descendant statistics for root nodes
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    include_stats: Option<bool>,

    /// Indent JSON output
    #[arg(long)]
    pretty: bool,

    /// Write only the summary file
    #[arg(long)]
    summary_only: bool,
}

impl CrawlArgs {
    /// Positional views followed by `--views`.
    fn target_views(&self) -> Vec<String> {
        self.view_names
            .iter()
            .chain(&self.views)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .collect()
    }

    /// Layer the given options over `settings`.
    fn apply(&self, settings: &mut CrawlSettings) {
        if let Some(output) = self.output.as_ref().filter(|o| !o.trim().is_empty()) {
            settings.output_path = Some(output.clone());
        }
        if let Some(format) = self.format {
            settings.output_format = format;
        }
        if let Some(depth) = self.max_depth {
            settings.max_depth = usize::try_from(depth).ok().filter(|d| *d > 0);
        }
        if let Some(workers) = self.max_workers.filter(|w| *w > 0) {
            settings.max_workers = workers;
        }
        if let Some(include) = self.include_stats {
            settings.include_stats = include;
        }
        if self.pretty {
            settings.pretty = true;
        }
        if self.summary_only {
            settings.summary_only = true;
        }
    }
}

fn build_client(metrics: &SharedMetrics, with_hook: bool) -> Result<CmdbRestClient, RunError> {
    let environment = CmdbEnvironment::from_env()?;
    let mut signer = RequestSigner::new(ApiCredentials::from_env()?);
    if with_hook {
        signer = signer.with_hook(probe::signing_hook());
    }

    Ok(CmdbRestClient::with_signer(signer, environment)?.with_metrics(metrics.clone()))
}

async fn run(command: Command, metrics: &SharedMetrics) -> Result<(), RunError> {
    match command {
        Command::Probe => {
            let client = build_client(metrics, true)?;
            probe::run_probe(&client, &probe::probe_cases()).await;
        }
        Command::Crawl(args) => {
            let mut settings = CrawlSettings::from_env()?;
            args.apply(&mut settings);
            let views = args.target_views();

            let client = build_client(metrics, false)?;
            info!(views = ?views, format = %settings.output_format, "Starting crawl");
            crawl::run_crawl(client, &settings, &views, metrics.clone()).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    common::init_logging();

    let command = cli.command.unwrap_or(Command::Probe);
    let is_crawl = matches!(command, Command::Crawl(_));
    let metrics = create_metrics();

    let result = run(command, &metrics).await;

    // Print final metrics
    println!("\n{}", metrics.snapshot());

    if let Err(e) = result {
        error!(error = %e, "Run failed");
        // A probe run reports, it never fails the process.
        if is_crawl {
            std::process::exit(1);
        }
    }

    info!("Done");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Option<Command> {
        let argv = std::iter::once("cmdb-probe").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap().command
    }

    fn crawl_args(args: &[&str]) -> CrawlArgs {
        match parse(args) {
            Some(Command::Crawl(args)) => args,
            other => panic!("expected crawl, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_is_probe() {
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["probe"]), Some(Command::Probe));
    }

    #[test]
    fn test_crawl_views() {
        assert_eq!(crawl_args(&["crawl"]), CrawlArgs::default());

        let args = crawl_args(&["crawl", "Business", "Ops", "--views", "Infra,Network"]);
        assert_eq!(args.target_views(), vec!["Business", "Ops", "Infra", "Network"]);
    }

    #[test]
    fn test_crawl_flags_are_not_views() {
        let args = crawl_args(&["crawl", "--max-depth", "2", "--format", "csv"]);

        assert!(args.target_views().is_empty());
        assert_eq!(args.max_depth, Some(2));
        assert_eq!(args.format, Some(OutputFormat::Csv));
    }

    #[test]
    fn test_crawl_flags_override_settings() {
        let args = crawl_args(&[
            "crawl",
            "-o",
            "out/trees.yaml",
            "-f",
            "yaml",
            "--max-depth",
            "3",
            "--max-workers",
            "4",
            "--include-stats=false",
            "--pretty",
            "--summary-only",
        ]);

        let mut settings = CrawlSettings::default();
        args.apply(&mut settings);

        assert_eq!(settings.output_path.as_deref(), Some("out/trees.yaml"));
        assert_eq!(settings.output_format, OutputFormat::Yaml);
        assert_eq!(settings.max_depth, Some(3));
        assert_eq!(settings.max_workers, 4);
        assert!(!settings.include_stats);
        assert!(settings.pretty);
        assert!(settings.summary_only);
    }

    #[test]
    fn test_absent_flags_keep_settings() {
        let mut settings = CrawlSettings {
            max_depth: Some(5),
            max_workers: 2,
            include_stats: false,
            output_format: OutputFormat::Csv,
            output_path: Some("env.csv".into()),
            ..Default::default()
        };
        let before = settings.clone();

        crawl_args(&["crawl"]).apply(&mut settings);

        assert_eq!(settings, before);
    }

    #[test]
    fn test_negative_max_depth_is_unlimited() {
        let args = crawl_args(&["crawl", "--max-depth", "-1", "--include-stats"]);
        assert_eq!(args.include_stats, Some(true));

        let mut settings = CrawlSettings {
            max_depth: Some(5),
            ..Default::default()
        };
        args.apply(&mut settings);
        assert_eq!(settings.max_depth, None);
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        let argv = |args: &[&'static str]| std::iter::once("cmdb-probe").chain(args.to_vec());

        assert!(Cli::try_parse_from(argv(&["deploy"])).is_err());
        assert!(Cli::try_parse_from(argv(&["probe", "extra"])).is_err());
        assert!(Cli::try_parse_from(argv(&["crawl", "--format", "xml"])).is_err());
        assert!(Cli::try_parse_from(argv(&["crawl", "--max-workers", "many"])).is_err());
    }
}
