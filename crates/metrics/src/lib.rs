use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Thread-safe counters for CMDB requests and crawl progress.
#[derive(Debug)]
pub struct CmdbMetrics {
    // Counters
    requests_sent: AtomicU64,
    requests_succeeded: AtomicU64,
    requests_failed: AtomicU64,
    trees_crawled: AtomicU64,
    nodes_crawled: AtomicU64,

    // Timestamps
    inner: RwLock<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    start_time: Instant,
    last_error_time: Option<Instant>,
}

impl Default for CmdbMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdbMetrics {
    pub fn new() -> Self {
        Self {
            requests_sent: AtomicU64::new(0),
            requests_succeeded: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
            trees_crawled: AtomicU64::new(0),
            nodes_crawled: AtomicU64::new(0),
            inner: RwLock::new(MetricsInner {
                start_time: Instant::now(),
                last_error_time: None,
            }),
        }
    }

    // --- Increment methods ---

    pub fn inc_requests_sent(&self) {
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_succeeded(&self) {
        self.requests_succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_requests_failed(&self) {
        self.requests_failed.fetch_add(1, Ordering::Relaxed);
        self.inner.write().last_error_time = Some(Instant::now());
    }

    pub fn inc_trees_crawled(&self) {
        self.trees_crawled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_nodes_crawled(&self, count: u64) {
        self.nodes_crawled.fetch_add(count, Ordering::Relaxed);
    }

    // --- Getter methods ---

    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    pub fn requests_succeeded(&self) -> u64 {
        self.requests_succeeded.load(Ordering::Relaxed)
    }

    pub fn requests_failed(&self) -> u64 {
        self.requests_failed.load(Ordering::Relaxed)
    }

    pub fn trees_crawled(&self) -> u64 {
        self.trees_crawled.load(Ordering::Relaxed)
    }

    pub fn nodes_crawled(&self) -> u64 {
        self.nodes_crawled.load(Ordering::Relaxed)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.inner.read().start_time.elapsed().as_secs_f64()
    }

    pub fn secs_since_last_error(&self) -> Option<f64> {
        self.inner
            .read()
            .last_error_time
            .map(|t| t.elapsed().as_secs_f64())
    }

    /// Generate a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: self.requests_sent(),
            requests_succeeded: self.requests_succeeded(),
            requests_failed: self.requests_failed(),
            trees_crawled: self.trees_crawled(),
            nodes_crawled: self.nodes_crawled(),
            elapsed_secs: self.elapsed_secs(),
            secs_since_last_error: self.secs_since_last_error(),
        }
    }
}

/// A point-in-time snapshot of metrics.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_sent: u64,
    pub requests_succeeded: u64,
    pub requests_failed: u64,
    pub trees_crawled: u64,
    pub nodes_crawled: u64,
    pub elapsed_secs: f64,
    pub secs_since_last_error: Option<f64>,
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every request succeeded.
    Clean,
    /// Some requests failed.
    Partial,
    /// Every request failed.
    Failed,
    /// No request was sent.
    Idle,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Clean => write!(f, "CLEAN"),
            RunStatus::Partial => write!(f, "PARTIAL"),
            RunStatus::Failed => write!(f, "FAILED"),
            RunStatus::Idle => write!(f, "IDLE"),
        }
    }
}

impl MetricsSnapshot {
    /// Classify the run from its success and failure counts.
    pub fn run_status(&self) -> RunStatus {
        match (self.requests_succeeded, self.requests_failed) {
            (0, 0) => RunStatus::Idle,
            (_, 0) => RunStatus::Clean,
            (0, _) => RunStatus::Failed,
            _ => RunStatus::Partial,
        }
    }
}

impl std::fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== CMDB Metrics ===")?;
        writeln!(f, "Status:              {}", self.run_status())?;
        writeln!(f, "Elapsed:             {:.1}s", self.elapsed_secs)?;
        writeln!(f, "Requests sent:       {}", self.requests_sent)?;
        writeln!(f, "Requests succeeded:  {}", self.requests_succeeded)?;
        writeln!(f, "Requests failed:     {}", self.requests_failed)?;
        if self.trees_crawled > 0 {
            writeln!(f, "Trees crawled:       {}", self.trees_crawled)?;
            writeln!(f, "Nodes crawled:       {}", self.nodes_crawled)?;
        }
        if let Some(secs) = self.secs_since_last_error {
            writeln!(f, "Since last error:    {:.1}s", secs)?;
        }
        Ok(())
    }
}

/// Shared handle to metrics.
pub type SharedMetrics = Arc<CmdbMetrics>;

pub fn create_metrics() -> SharedMetrics {
    Arc::new(CmdbMetrics::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(succeeded: u64, failed: u64) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_sent: succeeded + failed,
            requests_succeeded: succeeded,
            requests_failed: failed,
            trees_crawled: 0,
            nodes_crawled: 0,
            elapsed_secs: 1.0,
            secs_since_last_error: None,
        }
    }

    #[test]
    fn test_metrics_increment() {
        let metrics = CmdbMetrics::new();

        metrics.inc_requests_sent();
        metrics.inc_requests_sent();
        metrics.inc_requests_succeeded();
        metrics.inc_requests_failed();
        metrics.inc_trees_crawled();
        metrics.add_nodes_crawled(12);

        assert_eq!(metrics.requests_sent(), 2);
        assert_eq!(metrics.requests_succeeded(), 1);
        assert_eq!(metrics.requests_failed(), 1);
        assert_eq!(metrics.trees_crawled(), 1);
        assert_eq!(metrics.nodes_crawled(), 12);
    }

    #[test]
    fn test_last_error_time() {
        let metrics = CmdbMetrics::new();
        assert!(metrics.secs_since_last_error().is_none());

        metrics.inc_requests_failed();

        let secs = metrics.secs_since_last_error();
        assert!(secs.is_some());
        assert!(secs.unwrap() < 1.0);
    }

    #[test]
    fn test_metrics_snapshot() {
        let metrics = create_metrics();
        metrics.inc_requests_sent();
        metrics.inc_requests_succeeded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_sent, 1);
        assert_eq!(snapshot.requests_succeeded, 1);
        assert!(snapshot.elapsed_secs >= 0.0);
    }

    #[test]
    fn test_run_status() {
        assert_eq!(snapshot(0, 0).run_status(), RunStatus::Idle);
        assert_eq!(snapshot(5, 0).run_status(), RunStatus::Clean);
        assert_eq!(snapshot(3, 2).run_status(), RunStatus::Partial);
        assert_eq!(snapshot(0, 5).run_status(), RunStatus::Failed);
    }

    #[test]
    fn test_display_hides_crawl_lines_for_probe() {
        let text = snapshot(4, 1).to_string();
        assert!(text.contains("Status:              PARTIAL"));
        assert!(text.contains("Requests failed:     1"));
        assert!(!text.contains("Trees crawled"));
    }
}
