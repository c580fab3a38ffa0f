//! Data sources feeding the analyzer
//!
//! Implementations live outside the engine; the Kubernetes-backed ones are
//! in the CLI crate.

use crate::error::SourceError;
use crate::models::{ContainerSpec, UsageSample};
use async_trait::async_trait;

/// Enumerates containers and their declared resources
#[async_trait]
pub trait WorkloadSource: Send + Sync {
    /// List containers in `namespace`, or in every namespace when `None`
    async fn list_containers(&self, namespace: Option<&str>)
        -> Result<Vec<ContainerSpec>, SourceError>;
}

/// Enumerates instantaneous per-container usage
#[async_trait]
pub trait UsageSource: Send + Sync {
    /// List usage samples in `namespace`, or in every namespace when `None`
    async fn list_usage(&self, namespace: Option<&str>) -> Result<Vec<UsageSample>, SourceError>;
}

/// Usage source for clusters without a metrics pipeline
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUsage;

#[async_trait]
impl UsageSource for NoUsage {
    async fn list_usage(&self, _namespace: Option<&str>) -> Result<Vec<UsageSample>, SourceError> {
        Err(SourceError::MetricsUnavailable)
    }
}
