//! Observability for scans
//!
//! Provides:
//! - Prometheus metrics describing the last scan, in a scan-local registry
//! - Structured logging of scan lifecycle events with tracing

use crate::models::RiskTier;
use crate::scan::ScanReport;
use crate::summary::ScanSummary;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Histogram buckets for scan durations (in seconds)
const SCAN_DURATION_BUCKETS: &[f64] = &[0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Prometheus metrics for limit-checker scans
///
/// Each instance owns its registry, so several can coexist in one process.
#[derive(Clone)]
pub struct ScanMetrics {
    registry: Registry,
    containers_analyzed: IntGauge,
    containers_by_risk: IntGaugeVec,
    containers_without_limits: IntGauge,
    containers_without_requests: IntGauge,
    containers_with_usage: IntGauge,
    usage_available: IntGauge,
    scan_duration_seconds: Histogram,
}

impl ScanMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let containers_analyzed = IntGauge::new(
            "pod_limit_checker_containers_analyzed",
            "Number of containers analyzed in the last scan",
        )?;
        let containers_by_risk = IntGaugeVec::new(
            Opts::new(
                "pod_limit_checker_containers_by_risk",
                "Number of containers per risk tier in the last scan",
            ),
            &["tier"],
        )?;
        let containers_without_limits = IntGauge::new(
            "pod_limit_checker_containers_without_limits",
            "Number of containers with no resource limits",
        )?;
        let containers_without_requests = IntGauge::new(
            "pod_limit_checker_containers_without_requests",
            "Number of containers with no resource requests",
        )?;
        let containers_with_usage = IntGauge::new(
            "pod_limit_checker_containers_with_usage",
            "Number of containers matched with a usage sample",
        )?;
        let usage_available = IntGauge::new(
            "pod_limit_checker_usage_available",
            "Whether usage metrics could be fetched (1) or not (0)",
        )?;
        let scan_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "pod_limit_checker_scan_duration_seconds",
                "Time spent fetching and analyzing one scan",
            )
            .buckets(SCAN_DURATION_BUCKETS.to_vec()),
        )?;

        registry.register(Box::new(containers_analyzed.clone()))?;
        registry.register(Box::new(containers_by_risk.clone()))?;
        registry.register(Box::new(containers_without_limits.clone()))?;
        registry.register(Box::new(containers_without_requests.clone()))?;
        registry.register(Box::new(containers_with_usage.clone()))?;
        registry.register(Box::new(usage_available.clone()))?;
        registry.register(Box::new(scan_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            containers_analyzed,
            containers_by_risk,
            containers_without_limits,
            containers_without_requests,
            containers_with_usage,
            usage_available,
            scan_duration_seconds,
        })
    }

    /// Record the outcome of a scan
    pub fn record(&self, report: &ScanReport) {
        let summary = report.summary();

        self.containers_analyzed.set(summary.total as i64);
        for tier in [RiskTier::High, RiskTier::Medium, RiskTier::Low] {
            self.containers_by_risk
                .with_label_values(&[tier.as_str()])
                .set(summary.count(tier) as i64);
        }
        self.containers_without_limits
            .set(summary.without_limits as i64);
        self.containers_without_requests
            .set(summary.without_requests as i64);
        self.containers_with_usage.set(summary.with_usage as i64);
        self.usage_available
            .set(i64::from(report.usage_available()));
        self.scan_duration_seconds
            .observe(report.duration.as_secs_f64());
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> prometheus::Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Structured logger for scan events
#[derive(Debug, Clone)]
pub struct ScanLogger {
    cluster: String,
}

impl ScanLogger {
    pub fn new(cluster: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
        }
    }

    pub fn log_scan_started(&self, namespace: Option<&str>) {
        info!(
            event = "scan_started",
            cluster = %self.cluster,
            namespace = namespace.unwrap_or("<all>"),
            "Scanning workloads"
        );
    }

    pub fn log_usage_fetched(&self, samples: usize) {
        debug!(
            event = "usage_fetched",
            cluster = %self.cluster,
            samples = samples,
            "Fetched usage metrics"
        );
    }

    /// Usage could not be fetched; the scan continues without it
    pub fn log_usage_unavailable(&self, reason: &str) {
        warn!(
            event = "usage_unavailable",
            cluster = %self.cluster,
            reason = %reason,
            "Could not fetch usage metrics, continuing without metric-based suggestions"
        );
    }

    pub fn log_scan_completed(&self, summary: &ScanSummary, duration: Duration) {
        info!(
            event = "scan_completed",
            cluster = %self.cluster,
            containers = summary.total,
            high_risk = summary.high_risk,
            medium_risk = summary.medium_risk,
            low_risk = summary.low_risk,
            with_usage = summary.with_usage,
            duration_ms = duration.as_millis() as u64,
            "Scan completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{analyze, Threshold};
    use crate::models::{ContainerKey, ContainerSpec, UsageSnapshot};

    fn report(usage_error: Option<&str>) -> ScanReport {
        let specs = vec![
            ContainerSpec::new(ContainerKey::new("default", "web", "app")),
            ContainerSpec::new(ContainerKey::new("default", "api", "app")),
        ];
        ScanReport {
            results: analyze(&specs, &UsageSnapshot::default(), Threshold::default()),
            usage_error: usage_error.map(str::to_string),
            duration: Duration::from_millis(120),
        }
    }

    #[test]
    fn test_metrics_exposition() {
        let metrics = ScanMetrics::new().unwrap();
        metrics.record(&report(None));

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("pod_limit_checker_containers_analyzed 2"));
        assert!(text.contains("pod_limit_checker_containers_by_risk{tier=\"HIGH\"} 2"));
        assert!(text.contains("pod_limit_checker_containers_by_risk{tier=\"LOW\"} 0"));
        assert!(text.contains("pod_limit_checker_usage_available 1"));
        assert!(text.contains("pod_limit_checker_scan_duration_seconds_count 1"));
    }

    #[test]
    fn test_registries_are_independent() {
        let first = ScanMetrics::new().unwrap();
        let second = ScanMetrics::new().unwrap();
        first.record(&report(Some("metrics server not available")));

        assert!(first
            .encode_text()
            .unwrap()
            .contains("pod_limit_checker_usage_available 0"));
        assert!(second
            .encode_text()
            .unwrap()
            .contains("pod_limit_checker_containers_analyzed 0"));
    }

    #[test]
    fn test_scan_logger_creation() {
        let logger = ScanLogger::new("prod");
        assert_eq!(logger.cluster, "prod");
        logger.log_usage_unavailable("metrics server not available");
    }
}
