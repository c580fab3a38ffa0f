//! Scan orchestration
//!
//! Fetches workloads and usage concurrently, degrades to spec-only analysis
//! when usage cannot be fetched, and hands the materialized snapshots to
//! the analyzer.

use crate::analyzer::Analyzer;
use crate::error::ScanError;
use crate::models::{AnalysisResult, UsageSnapshot};
use crate::observability::ScanLogger;
use crate::source::{UsageSource, WorkloadSource};
use crate::summary::ScanSummary;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default time allowed for each source to answer
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of one scan
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub results: Vec<AnalysisResult>,
    /// Why usage was unavailable, if it was
    pub usage_error: Option<String>,
    pub duration: Duration,
}

impl ScanReport {
    pub fn usage_available(&self) -> bool {
        self.usage_error.is_none()
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary::from_results(&self.results)
    }
}

/// Runs one analysis pass against a pair of sources
pub struct Scanner {
    workloads: Arc<dyn WorkloadSource>,
    usage: Arc<dyn UsageSource>,
    analyzer: Analyzer,
    fetch_timeout: Duration,
    logger: ScanLogger,
}

impl Scanner {
    pub fn new(
        workloads: Arc<dyn WorkloadSource>,
        usage: Arc<dyn UsageSource>,
        analyzer: Analyzer,
    ) -> Self {
        Self {
            workloads,
            usage,
            analyzer,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            logger: ScanLogger::new("default"),
        }
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: Duration) -> Self {
        self.fetch_timeout = fetch_timeout;
        self
    }

    pub fn with_logger(mut self, logger: ScanLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Scan one namespace, or all namespaces when `None`
    pub async fn run(&self, namespace: Option<&str>) -> Result<ScanReport, ScanError> {
        let started = Instant::now();
        self.logger.log_scan_started(namespace);

        let (specs, samples) = tokio::join!(
            tokio::time::timeout(self.fetch_timeout, self.workloads.list_containers(namespace)),
            tokio::time::timeout(self.fetch_timeout, self.usage.list_usage(namespace)),
        );

        let specs = match specs {
            Ok(Ok(specs)) => specs,
            Ok(Err(e)) => return Err(ScanError::Workloads(e)),
            Err(_) => return Err(ScanError::WorkloadsTimedOut(self.fetch_timeout.as_secs())),
        };

        let usage = match samples {
            Ok(Ok(samples)) => UsageSnapshot::Available(samples),
            Ok(Err(e)) => UsageSnapshot::unavailable(e.to_string()),
            Err(_) => UsageSnapshot::unavailable(format!(
                "timed out after {}s",
                self.fetch_timeout.as_secs()
            )),
        };
        let usage_error = match &usage {
            UsageSnapshot::Unavailable { reason } => {
                self.logger.log_usage_unavailable(reason);
                Some(reason.clone())
            }
            UsageSnapshot::Available(samples) => {
                self.logger.log_usage_fetched(samples.len());
                None
            }
        };

        let results = self.analyzer.analyze(&specs, &usage);
        let report = ScanReport {
            results,
            usage_error,
            duration: started.elapsed(),
        };
        self.logger
            .log_scan_completed(&report.summary(), report.duration);

        Ok(report)
    }
}
