//! Core data models for the limit checker

use crate::quantity::Quantity;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Identity of one container within a scan
///
/// The `(namespace, workload, container)` triple is the join key between
/// workload specs and usage samples.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerKey {
    pub namespace: String,
    pub workload: String,
    pub container: String,
}

impl ContainerKey {
    pub fn new(
        namespace: impl Into<String>,
        workload: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            workload: workload.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.workload, self.container)
    }
}

/// Name of a governed resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceName {
    Cpu,
    Memory,
    /// Any other resource, e.g. `ephemeral-storage` or an extended resource
    Other(String),
}

impl ResourceName {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Other(name) => name,
        }
    }

    /// Human-facing label used in suggestions
    pub fn label(&self) -> &str {
        match self {
            Self::Cpu => "CPU",
            Self::Memory => "Memory",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        match name {
            "cpu" => Self::Cpu,
            "memory" => Self::Memory,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ResourceName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ResourceName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name.as_str()))
    }
}

/// Declared limits or requests of a container
pub type ResourceList = BTreeMap<ResourceName, Quantity>;

/// Declared resource configuration of one container
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSpec {
    pub key: ContainerKey,
    pub limits: ResourceList,
    pub requests: ResourceList,
    /// Time since the owning pod was created
    pub age: Duration,
}

impl ContainerSpec {
    pub fn new(key: ContainerKey) -> Self {
        Self {
            key,
            limits: ResourceList::new(),
            requests: ResourceList::new(),
            age: Duration::ZERO,
        }
    }

    pub fn with_limit(mut self, name: ResourceName, quantity: Quantity) -> Self {
        self.limits.insert(name, quantity);
        self
    }

    pub fn with_request(mut self, name: ResourceName, quantity: Quantity) -> Self {
        self.requests.insert(name, quantity);
        self
    }

    pub fn with_age(mut self, age: Duration) -> Self {
        self.age = age;
        self
    }

    pub fn has_limits(&self) -> bool {
        !self.limits.is_empty()
    }

    pub fn has_requests(&self) -> bool {
        !self.requests.is_empty()
    }
}

/// Instantaneous resource consumption of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

impl ResourceUsage {
    pub fn new(cpu_millicores: u64, memory_bytes: u64) -> Self {
        Self {
            cpu_millicores,
            memory_bytes,
        }
    }

    /// CPU usage in fractional cores
    pub fn cpu_cores(&self) -> f64 {
        self.cpu_millicores as f64 / 1000.0
    }
}

/// Usage sample for one container, keyed for the join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSample {
    pub key: ContainerKey,
    pub usage: ResourceUsage,
}

impl UsageSample {
    pub fn new(key: ContainerKey, usage: ResourceUsage) -> Self {
        Self { key, usage }
    }
}

/// Outcome of fetching usage telemetry
///
/// `Available` with zero samples and `Unavailable` are reported differently
/// but analyze the same way: no container gets usage.
#[derive(Debug, Clone, PartialEq)]
pub enum UsageSnapshot {
    Available(Vec<UsageSample>),
    Unavailable { reason: String },
}

impl UsageSnapshot {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn samples(&self) -> &[UsageSample] {
        match self {
            Self::Available(samples) => samples,
            Self::Unavailable { .. } => &[],
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

impl Default for UsageSnapshot {
    fn default() -> Self {
        Self::Available(Vec::new())
    }
}

/// Governance risk of a container
///
/// Ordered from most to least severe, so an ascending sort lists HIGH first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    High,
    Medium,
    Low,
}

impl RiskTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    pub fn is_at_risk(&self) -> bool {
        matches!(self, Self::High | Self::Medium)
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One advisory finding about a container
#[derive(Debug, Clone, PartialEq)]
pub enum Suggestion {
    MissingLimits,
    MissingRequests,
    IncreaseLimit {
        resource: ResourceName,
        usage_percent: f64,
    },
    DecreaseLimit {
        resource: ResourceName,
        usage_percent: f64,
    },
    /// No limits and no telemetry to size them from
    SetLimitsFromRequirements,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLimits => f.write_str("No resource limits set"),
            Self::MissingRequests => f.write_str("No resource requests set"),
            Self::IncreaseLimit {
                resource,
                usage_percent,
            } => write!(
                f,
                "{} usage at {:.1}% of limit, consider increasing limit",
                resource.label(),
                usage_percent
            ),
            Self::DecreaseLimit {
                resource,
                usage_percent,
            } => write!(
                f,
                "{} usage at {:.1}% of limit, consider decreasing limit",
                resource.label(),
                usage_percent
            ),
            Self::SetLimitsFromRequirements => {
                f.write_str("Consider setting limits based on application requirements")
            }
        }
    }
}

impl Serialize for Suggestion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Recommended limits and requests derived from observed usage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedResources {
    pub cpu_limit: String,
    pub cpu_request: String,
    pub memory_limit: String,
    pub memory_request: String,
}

/// Verdict for one container
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub key: ContainerKey,
    #[serde(serialize_with = "serialize_age")]
    pub age: Duration,
    pub has_limits: bool,
    pub has_requests: bool,
    pub current_limits: ResourceList,
    pub current_usage: Option<ResourceUsage>,
    pub risk: RiskTier,
    pub suggestions: Vec<Suggestion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended: Option<RecommendedResources>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example_snippet: Option<String>,
}

impl AnalysisResult {
    /// First suggestion, used as the headline in compact listings
    pub fn headline(&self) -> Option<&Suggestion> {
        self.suggestions.first()
    }
}

fn serialize_age<S: Serializer>(age: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_age(*age))
}

/// Render an age the way kubectl does: `45s`, `12m`, `5h`, `3d`, `2y`
pub fn format_age(age: Duration) -> String {
    let seconds = age.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;

    if seconds < 60 {
        format!("{}s", seconds)
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else if hours < 24 {
        format!("{}h", hours)
    } else if hours < 24 * 365 {
        format!("{}d", hours / 24)
    } else {
        format!("{}y", hours / 24 / 365)
    }
}
