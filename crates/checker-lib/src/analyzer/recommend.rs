//! Recommended limits and requests from observed usage
//!
//! Limits get 2.5x the current usage as spike headroom, requests get 1.2x
//! as a baseline buffer. All arithmetic is integer on milli-cores and bytes.

use crate::models::{RecommendedResources, ResourceUsage};
use crate::quantity::MIB;

/// Smallest recommended CPU limit (100m)
pub const CPU_LIMIT_FLOOR_MILLICORES: u64 = 100;

/// Smallest recommended CPU request (50m)
pub const CPU_REQUEST_FLOOR_MILLICORES: u64 = 50;

/// Smallest recommended memory limit (128Mi)
pub const MEMORY_LIMIT_FLOOR_BYTES: u64 = 128 * MIB;

/// Smallest recommended memory request (64Mi)
pub const MEMORY_REQUEST_FLOOR_BYTES: u64 = 64 * MIB;

fn limit_of(amount: u64, floor: u64) -> u64 {
    (amount.saturating_mul(5) / 2).max(floor)
}

fn request_of(amount: u64, floor: u64) -> u64 {
    (amount.saturating_mul(6) / 5).max(floor)
}

/// Compute recommended values for a container with known usage
pub fn recommend(usage: &ResourceUsage) -> RecommendedResources {
    let cpu_limit = limit_of(usage.cpu_millicores, CPU_LIMIT_FLOOR_MILLICORES);
    let cpu_request = request_of(usage.cpu_millicores, CPU_REQUEST_FLOOR_MILLICORES);
    let memory_limit = limit_of(usage.memory_bytes, MEMORY_LIMIT_FLOOR_BYTES);
    let memory_request = request_of(usage.memory_bytes, MEMORY_REQUEST_FLOOR_BYTES);

    RecommendedResources {
        cpu_limit: format!("{}m", cpu_limit),
        cpu_request: format!("{}m", cpu_request),
        // Whole mebibytes, truncated
        memory_limit: format!("{}Mi", memory_limit / MIB),
        memory_request: format!("{}Mi", memory_request / MIB),
    }
}

/// Resource block ready to paste under a container in a pod template
pub fn example_snippet(recommended: &RecommendedResources) -> String {
    format!(
        "        resources:\n          limits:\n            cpu: \"{}\"\n            memory: \"{}\"\n          requests:\n            cpu: \"{}\"\n            memory: \"{}\"",
        recommended.cpu_limit,
        recommended.memory_limit,
        recommended.cpu_request,
        recommended.memory_request,
    )
}
