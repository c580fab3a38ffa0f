//! Analysis engine
//!
//! Joins declared container resources with usage samples and produces one
//! [`AnalysisResult`] per container: configuration gaps, a risk tier,
//! ordered suggestions and, when usage is known, recommended values.
//!
//! The engine is a pure function of its inputs. It performs no I/O, keeps
//! no state between calls and never logs.

mod recommend;
mod risk;
mod suggestions;

#[cfg(test)]
mod tests;

pub use recommend::{
    example_snippet, recommend, CPU_LIMIT_FLOOR_MILLICORES, CPU_REQUEST_FLOOR_MILLICORES,
    MEMORY_LIMIT_FLOOR_BYTES, MEMORY_REQUEST_FLOOR_BYTES,
};
pub use risk::{classify_risk, CPU_TIGHTNESS_RATIO};
pub use suggestions::{
    generate_suggestions, CPU_DECREASE_BELOW_PERCENT, MEMORY_DECREASE_BELOW_PERCENT,
};

use crate::error::ThresholdError;
use crate::models::{
    AnalysisResult, ContainerKey, ContainerSpec, ResourceUsage, UsageSample, UsageSnapshot,
};
use std::collections::HashMap;

/// Default suggestion threshold (80% of the limit)
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Usage ratio above which an "increase limit" suggestion is emitted
///
/// Always within (0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, ThresholdError> {
        if value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ThresholdError(value))
        }
    }

    pub fn get(&self) -> f64 {
        self.0
    }

    /// Threshold expressed as a percentage of the limit
    pub fn percent(&self) -> f64 {
        self.0 * 100.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl TryFrom<f64> for Threshold {
    type Error = ThresholdError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Exact-key lookup of usage samples
///
/// Later samples for the same key replace earlier ones.
#[derive(Debug, Default)]
struct UsageIndex<'a> {
    by_key: HashMap<&'a ContainerKey, ResourceUsage>,
}

impl<'a> UsageIndex<'a> {
    fn new(samples: &'a [UsageSample]) -> Self {
        let by_key = samples.iter().map(|s| (&s.key, s.usage)).collect();
        Self { by_key }
    }

    fn get(&self, key: &ContainerKey) -> Option<ResourceUsage> {
        self.by_key.get(key).copied()
    }
}

/// Analyzes container specs against usage telemetry
#[derive(Debug, Clone, Copy, Default)]
pub struct Analyzer {
    threshold: Threshold,
}

impl Analyzer {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Produce one result per spec, in input order
    pub fn analyze(&self, specs: &[ContainerSpec], usage: &UsageSnapshot) -> Vec<AnalysisResult> {
        let index = UsageIndex::new(usage.samples());
        specs
            .iter()
            .map(|spec| self.analyze_container(spec, index.get(&spec.key)))
            .collect()
    }

    /// Verdict for a single container with its matched usage, if any
    pub fn analyze_container(
        &self,
        spec: &ContainerSpec,
        usage: Option<ResourceUsage>,
    ) -> AnalysisResult {
        let suggestions =
            generate_suggestions(&spec.limits, &spec.requests, usage.as_ref(), self.threshold);
        let risk = classify_risk(&spec.limits, &spec.requests, usage.as_ref());
        let recommended = usage.as_ref().map(recommend);
        let example_snippet = match &recommended {
            Some(rec) if !spec.has_limits() => Some(example_snippet(rec)),
            _ => None,
        };

        AnalysisResult {
            key: spec.key.clone(),
            age: spec.age,
            has_limits: spec.has_limits(),
            has_requests: spec.has_requests(),
            current_limits: spec.limits.clone(),
            current_usage: usage,
            risk,
            suggestions,
            recommended,
            example_snippet,
        }
    }
}

/// Analyze with an explicit threshold
pub fn analyze(
    specs: &[ContainerSpec],
    usage: &UsageSnapshot,
    threshold: Threshold,
) -> Vec<AnalysisResult> {
    Analyzer::new(threshold).analyze(specs, usage)
}
