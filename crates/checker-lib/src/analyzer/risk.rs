//! Risk tier classification

use crate::models::{ResourceList, ResourceName, ResourceUsage, RiskTier};

/// CPU usage-to-limit ratio above which complete limits are still MEDIUM risk
///
/// Fixed, and independent of the user-configurable suggestion threshold.
pub const CPU_TIGHTNESS_RATIO: f64 = 0.9;

/// Classify governance risk; the first matching rule wins
///
/// 1. no limits at all: HIGH
/// 2. limits missing CPU or memory: MEDIUM
/// 3. CPU usage above 90% of its limit: MEDIUM
/// 4. otherwise: LOW
///
/// Requests do not influence the tier.
pub fn classify_risk(
    limits: &ResourceList,
    _requests: &ResourceList,
    usage: Option<&ResourceUsage>,
) -> RiskTier {
    if limits.is_empty() {
        return RiskTier::High;
    }

    let (Some(cpu_limit), Some(_)) = (
        limits.get(&ResourceName::Cpu),
        limits.get(&ResourceName::Memory),
    ) else {
        return RiskTier::Medium;
    };

    if let Some(usage) = usage {
        let limit_millis = cpu_limit.millis();
        if limit_millis > 0
            && usage.cpu_millicores as f64 / limit_millis as f64 > CPU_TIGHTNESS_RATIO
        {
            return RiskTier::Medium;
        }
    }

    RiskTier::Low
}
