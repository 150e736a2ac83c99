//! Crawl and export settings.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Export file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON document with metadata and every tree.
    #[default]
    Json,
    /// Same document as JSON, in YAML.
    Yaml,
    /// One row per node.
    Csv,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = ParseOutputFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "csv" => Ok(Self::Csv),
            _ => Err(ParseOutputFormatError(s.to_string())),
        }
    }
}

/// Error parsing an output format string.
#[derive(Debug, Clone)]
pub struct ParseOutputFormatError(String);

impl fmt::Display for ParseOutputFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid output format '{}', expected 'json', 'yaml' or 'csv'", self.0)
    }
}

impl std::error::Error for ParseOutputFormatError {}

/// Settings for the service-tree crawl and its export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Deepest level to fetch, `None` for no limit.
    pub max_depth: Option<usize>,
    /// `count` sent with every search.
    pub page_size: u32,
    /// Root subtrees crawled at the same time.
    pub max_workers: usize,
    /// Fetch descendant statistics for root nodes.
    pub include_stats: bool,
    /// Pause before every child query.
    pub request_interval: Duration,
    /// Export format.
    pub output_format: OutputFormat,
    /// Export path, generated when `None`.
    pub output_path: Option<String>,
    /// Indent JSON output.
    pub pretty: bool,
    /// Write only the summary file.
    pub summary_only: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_depth: None,
            page_size: 1000,
            max_workers: 10,
            include_stats: true,
            request_interval: Duration::from_millis(100),
            output_format: OutputFormat::Json,
            output_path: None,
            pretty: false,
            summary_only: false,
        }
    }
}

impl CrawlSettings {
    /// Load from the `CMDB_*` crawl variables (`CMDB_MAX_DEPTH`, `CMDB_PAGE_SIZE`, ...).
    pub fn from_env() -> Result<Self, ConfigError> {
        crate::load_dotenv();
        Self::from_lookup(crate::process_env)
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(raw) = lookup("CMDB_MAX_DEPTH") {
            let depth: i64 = parse_num("CMDB_MAX_DEPTH", &raw)?;
            // Zero or negative means unlimited.
            settings.max_depth = usize::try_from(depth).ok().filter(|d| *d > 0);
        }
        if let Some(raw) = lookup("CMDB_PAGE_SIZE") {
            settings.page_size = parse_positive("CMDB_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = lookup("CMDB_MAX_WORKERS") {
            settings.max_workers = parse_positive("CMDB_MAX_WORKERS", &raw)?;
        }
        if let Some(raw) = lookup("CMDB_INCLUDE_STATS") {
            settings.include_stats = parse_bool("CMDB_INCLUDE_STATS", &raw)?;
        }
        if let Some(raw) = lookup("CMDB_REQUEST_INTERVAL_MS") {
            let ms: u64 = parse_num("CMDB_REQUEST_INTERVAL_MS", &raw)?;
            settings.request_interval = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("CMDB_OUTPUT_FORMAT") {
            settings.output_format = raw
                .parse()
                .map_err(|e: ParseOutputFormatError| {
                    ConfigError::invalid("CMDB_OUTPUT_FORMAT", &raw, e.to_string())
                })?;
        }
        if let Some(raw) = lookup("CMDB_OUTPUT_PATH") {
            if !raw.trim().is_empty() {
                settings.output_path = Some(raw);
            }
        }
        if let Some(raw) = lookup("CMDB_PRETTY") {
            settings.pretty = parse_bool("CMDB_PRETTY", &raw)?;
        }
        if let Some(raw) = lookup("CMDB_SUMMARY_ONLY") {
            settings.summary_only = parse_bool("CMDB_SUMMARY_ONLY", &raw)?;
        }

        Ok(settings)
    }
}

fn parse_num<T: FromStr>(name: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(name, raw, "integer"))
}

fn parse_positive<T>(name: &str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
{
    let value: T = parse_num(name, raw)?;
    if value <= T::default() {
        return Err(ConfigError::invalid(name, raw, "must be greater than zero"));
    }
    Ok(value)
}

fn parse_bool(name: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(name, raw, "boolean")),
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
    fn test_defaults() {
        let settings = CrawlSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, CrawlSettings::default());
        assert_eq!(settings.max_depth, None);
        assert_eq!(settings.page_size, 1000);
        assert_eq!(settings.max_workers, 10);
        assert!(settings.include_stats);
        assert_eq!(settings.request_interval, Duration::from_millis(100));
    }

    #[test]
    fn test_overrides() {
        let settings = CrawlSettings::from_lookup(lookup(&[
            ("CMDB_MAX_DEPTH", "2"),
            ("CMDB_PAGE_SIZE", "100"),
            ("CMDB_MAX_WORKERS", "5"),
            ("CMDB_INCLUDE_STATS", "false"),
            ("CMDB_REQUEST_INTERVAL_MS", "200"),
            ("CMDB_OUTPUT_FORMAT", "CSV"),
            ("CMDB_OUTPUT_PATH", "out/trees.csv"),
            ("CMDB_PRETTY", "yes"),
            ("CMDB_SUMMARY_ONLY", "1"),
        ]))
        .unwrap();

        assert_eq!(settings.max_depth, Some(2));
        assert_eq!(settings.page_size, 100);
        assert_eq!(settings.max_workers, 5);
        assert!(!settings.include_stats);
        assert_eq!(settings.request_interval, Duration::from_millis(200));
        assert_eq!(settings.output_format, OutputFormat::Csv);
        assert_eq!(settings.output_path.as_deref(), Some("out/trees.csv"));
        assert!(settings.pretty);
        assert!(settings.summary_only);
    }

    #[test]
    fn test_negative_depth_is_unlimited() {
        let settings = CrawlSettings::from_lookup(lookup(&[("CMDB_MAX_DEPTH", "-1")])).unwrap();
        assert_eq!(settings.max_depth, None);
    }

    #[test]
    fn test_invalid_values() {
        assert!(CrawlSettings::from_lookup(lookup(&[("CMDB_PAGE_SIZE", "0")])).is_err());
        assert!(CrawlSettings::from_lookup(lookup(&[("CMDB_MAX_WORKERS", "many")])).is_err());
        assert!(CrawlSettings::from_lookup(lookup(&[("CMDB_PRETTY", "maybe")])).is_err());
        assert!(CrawlSettings::from_lookup(lookup(&[("CMDB_OUTPUT_FORMAT", "xml")])).is_err());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("Csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("yml".parse::<OutputFormat>().unwrap(), OutputFormat::Yaml);
        assert_eq!(OutputFormat::Yaml.extension(), "yaml");
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Csv.to_string(), "csv");
    }
}
