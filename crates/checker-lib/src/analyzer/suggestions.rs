//! Suggestion generation
//!
//! Rules are independent and evaluated in a fixed order, since the first
//! suggestion is shown as the headline of a container.

use super::Threshold;
use crate::models::{ResourceList, ResourceName, ResourceUsage, Suggestion};

/// CPU usage percentage below which a smaller limit is suggested
pub const CPU_DECREASE_BELOW_PERCENT: f64 = 30.0;

/// Memory usage percentage below which a smaller limit is suggested
///
/// Higher than the CPU trigger: over-provisioned memory is the safer error.
pub const MEMORY_DECREASE_BELOW_PERCENT: f64 = 50.0;

/// Build the ordered suggestions for one container
pub fn generate_suggestions(
    limits: &ResourceList,
    requests: &ResourceList,
    usage: Option<&ResourceUsage>,
    threshold: Threshold,
) -> Vec<Suggestion> {
    let mut suggestions = Vec::new();

    if limits.is_empty() {
        suggestions.push(Suggestion::MissingLimits);
    }
    if requests.is_empty() {
        suggestions.push(Suggestion::MissingRequests);
    }

    match usage {
        Some(usage) => {
            let checks = [
                (
                    ResourceName::Cpu,
                    usage.cpu_millicores,
                    limits.get(&ResourceName::Cpu).map(|q| q.millis()),
                    CPU_DECREASE_BELOW_PERCENT,
                ),
                (
                    ResourceName::Memory,
                    usage.memory_bytes,
                    limits.get(&ResourceName::Memory).map(|q| q.value()),
                    MEMORY_DECREASE_BELOW_PERCENT,
                ),
            ];

            for (resource, used, limit, decrease_below) in checks {
                if let Some(suggestion) =
                    usage_suggestion(resource, used, limit, threshold, decrease_below)
                {
                    suggestions.push(suggestion);
                }
            }
        }
        None if limits.is_empty() => suggestions.push(Suggestion::SetLimitsFromRequirements),
        None => {}
    }

    suggestions
}

/// Compare one resource's usage against its limit, both in the same unit
fn usage_suggestion(
    resource: ResourceName,
    used: u64,
    limit: Option<u64>,
    threshold: Threshold,
    decrease_below: f64,
) -> Option<Suggestion> {
    let limit = limit.filter(|l| *l > 0)?;
    let usage_percent = used as f64 / limit as f64 * 100.0;

    if usage_percent > threshold.percent() {
        Some(Suggestion::IncreaseLimit {
            resource,
            usage_percent,
        })
    } else if usage_percent < decrease_below {
        Some(Suggestion::DecreaseLimit {
            resource,
            usage_percent,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;

    fn complete_limits(cpu_millicores: u64, memory_mib: u64) -> ResourceList {
        let mut list = ResourceList::new();
        list.insert(ResourceName::Cpu, Quantity::from_millicores(cpu_millicores));
        list.insert(ResourceName::Memory, Quantity::from_mebibytes(memory_mib));
        list
    }

    #[test]
    fn test_missing_everything_without_usage() {
        let empty = ResourceList::new();
        let suggestions = generate_suggestions(&empty, &empty, None, Threshold::default());
        assert_eq!(
            suggestions,
            vec![
                Suggestion::MissingLimits,
                Suggestion::MissingRequests,
                Suggestion::SetLimitsFromRequirements,
            ]
        );
    }

    #[test]
    fn test_missing_limits_with_usage_skips_fallback() {
        let empty = ResourceList::new();
        let usage = ResourceUsage::new(10, 10 * 1024 * 1024);
        let suggestions = generate_suggestions(&empty, &empty, Some(&usage), Threshold::default());
        assert_eq!(
            suggestions,
            vec![Suggestion::MissingLimits, Suggestion::MissingRequests]
        );
    }

    #[test]
    fn test_increase_when_over_threshold() {
        let limits = complete_limits(100, 100);
        let requests = complete_limits(50, 50);
        let usage = ResourceUsage::new(95, 95 * 1024 * 1024);

        let suggestions =
            generate_suggestions(&limits, &requests, Some(&usage), Threshold::new(0.9).unwrap());
        assert_eq!(suggestions.len(), 2);
        assert!(matches!(
            &suggestions[0],
            Suggestion::IncreaseLimit { resource: ResourceName::Cpu, usage_percent }
                if (*usage_percent - 95.0).abs() < 1e-9
        ));
        assert!(matches!(
            &suggestions[1],
            Suggestion::IncreaseLimit { resource: ResourceName::Memory, .. }
        ));
    }

    #[test]
    fn test_decrease_triggers_differ_per_resource() {
        let limits = complete_limits(1000, 1000);
        let requests = complete_limits(100, 100);
        // CPU at 40% (no suggestion), memory at 40% (below the 50% trigger)
        let usage = ResourceUsage::new(400, 400 * 1024 * 1024);

        let suggestions =
            generate_suggestions(&limits, &requests, Some(&usage), Threshold::default());
        assert_eq!(suggestions.len(), 1);
        assert!(matches!(
            &suggestions[0],
            Suggestion::DecreaseLimit { resource: ResourceName::Memory, .. }
        ));
    }

    #[test]
    fn test_usage_between_triggers_is_quiet() {
        let limits = complete_limits(1000, 1000);
        let requests = complete_limits(100, 100);
        let usage = ResourceUsage::new(600, 600 * 1024 * 1024);

        let suggestions =
            generate_suggestions(&limits, &requests, Some(&usage), Threshold::default());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_zero_or_absent_limit_is_skipped() {
        let mut limits = ResourceList::new();
        limits.insert(ResourceName::Cpu, Quantity::from_millicores(0));
        let requests = complete_limits(100, 100);
        let usage = ResourceUsage::new(600, 600);

        let suggestions =
            generate_suggestions(&limits, &requests, Some(&usage), Threshold::default());
        assert!(suggestions.is_empty());
    }

    #[test]
    fn test_partial_limits_without_usage_get_no_fallback() {
        let mut limits = ResourceList::new();
        limits.insert(ResourceName::Cpu, Quantity::from_millicores(100));
        let empty = ResourceList::new();

        let suggestions = generate_suggestions(&limits, &empty, None, Threshold::default());
        assert_eq!(suggestions, vec![Suggestion::MissingRequests]);
    }
}
