//! Aggregate counts over a set of analysis results

use crate::models::{AnalysisResult, RiskTier};
use serde::Serialize;

/// Counts shown after a report and exported as metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub total: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    pub without_limits: usize,
    pub without_requests: usize,
    pub with_usage: usize,
}

impl ScanSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            summary.total += 1;
            match result.risk {
                RiskTier::High => summary.high_risk += 1,
                RiskTier::Medium => summary.medium_risk += 1,
                RiskTier::Low => summary.low_risk += 1,
            }
            if !result.has_limits {
                summary.without_limits += 1;
            }
            if !result.has_requests {
                summary.without_requests += 1;
            }
            if result.current_usage.is_some() {
                summary.with_usage += 1;
            }
            summary
        })
    }

    pub fn count(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::High => self.high_risk,
            RiskTier::Medium => self.medium_risk,
            RiskTier::Low => self.low_risk,
        }
    }
}
