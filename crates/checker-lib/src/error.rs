//! Error types for the checker library

use thiserror::Error;

/// Failure to parse a Kubernetes resource quantity such as `250m` or `1Gi`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("invalid number in quantity '{0}'")]
    InvalidNumber(String),

    #[error("unknown suffix '{suffix}' in quantity '{quantity}'")]
    UnknownSuffix { quantity: String, suffix: String },

    #[error("negative quantity '{0}' is not a valid resource amount")]
    Negative(String),

    #[error("quantity '{0}' is out of range")]
    Overflow(String),
}

/// Rejected suggestion threshold
#[derive(Debug, Clone, PartialEq, Error)]
#[error("threshold must be within (0, 1], got {0}")]
pub struct ThresholdError(pub f64);

/// Errors reported by workload and usage sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to connect to the cluster: {0}")]
    Connection(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("metrics server not available or not installed")]
    MetricsUnavailable,

    #[error("invalid {resource} quantity on {container}: {source}")]
    Quantity {
        container: String,
        resource: String,
        #[source]
        source: QuantityError,
    },
}

/// Errors that abort a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list workloads: {0}")]
    Workloads(#[source] SourceError),

    #[error("listing workloads timed out after {0}s")]
    WorkloadsTimedOut(u64),
}
