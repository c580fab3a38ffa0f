//! Library for checking container resource governance
//!
//! This crate provides the core functionality for:
//! - Parsing Kubernetes resource quantities
//! - Analyzing containers for missing limits and requests
//! - Risk classification and usage-based recommendations
//! - Scan orchestration over pluggable workload and usage sources
//! - Scan metrics and structured logging

pub mod analyzer;
pub mod error;
pub mod models;
pub mod observability;
pub mod quantity;
pub mod scan;
pub mod source;
pub mod summary;

pub use analyzer::{analyze, Analyzer, Threshold, DEFAULT_THRESHOLD};
pub use error::{QuantityError, ScanError, SourceError, ThresholdError};
pub use models::*;
pub use observability::{ScanLogger, ScanMetrics};
pub use quantity::Quantity;
pub use scan::{ScanReport, Scanner, DEFAULT_FETCH_TIMEOUT};
pub use source::{NoUsage, UsageSource, WorkloadSource};
pub use summary::ScanSummary;
