//! End-to-end engine tests over whole container snapshots

use super::*;
use crate::models::{ResourceName, RiskTier, Suggestion};
use crate::quantity::{Quantity, MIB};
use std::time::Duration;

fn key(workload: &str, container: &str) -> ContainerKey {
    ContainerKey::new("default", workload, container)
}

fn bare(workload: &str) -> ContainerSpec {
    ContainerSpec::new(key(workload, "app")).with_age(Duration::from_secs(3600))
}

fn governed(workload: &str, cpu_millicores: u64, memory_mib: u64) -> ContainerSpec {
    bare(workload)
        .with_limit(ResourceName::Cpu, Quantity::from_millicores(cpu_millicores))
        .with_limit(ResourceName::Memory, Quantity::from_mebibytes(memory_mib))
}

fn sample(workload: &str, cpu_millicores: u64, memory_bytes: u64) -> UsageSample {
    UsageSample::new(
        key(workload, "app"),
        ResourceUsage::new(cpu_millicores, memory_bytes),
    )
}

#[test]
fn scenario_no_limits_no_requests_no_usage() {
    let results = analyze(
        &[bare("web")],
        &UsageSnapshot::Available(vec![]),
        Threshold::default(),
    );
    let result = &results[0];

    assert!(!result.has_limits);
    assert!(!result.has_requests);
    assert_eq!(result.risk, RiskTier::High);
    assert!(result.suggestions.contains(&Suggestion::MissingLimits));
    assert!(result.suggestions.contains(&Suggestion::MissingRequests));
    assert!(result
        .suggestions
        .contains(&Suggestion::SetLimitsFromRequirements));
    assert!(result.current_usage.is_none());
    assert!(result.recommended.is_none());
    assert!(result.example_snippet.is_none());
}

#[test]
fn scenario_low_usage_against_complete_limits() {
    let spec = governed("api", 200, 256);
    let usage = UsageSnapshot::Available(vec![sample("api", 50, 64 * MIB)]);
    let results = analyze(&[spec], &usage, Threshold::new(0.8).unwrap());
    let result = &results[0];

    assert!(result.has_limits);
    assert!(!result.has_requests);
    // Requests do not feed the tier: both limits are set and CPU sits at 25%
    assert_eq!(result.risk, RiskTier::Low);
    assert_eq!(result.suggestions[0], Suggestion::MissingRequests);
    assert!(matches!(
        &result.suggestions[1],
        Suggestion::DecreaseLimit { resource: ResourceName::Cpu, usage_percent }
            if (*usage_percent - 25.0).abs() < 1e-9
    ));
    assert!(matches!(
        &result.suggestions[2],
        Suggestion::DecreaseLimit { resource: ResourceName::Memory, .. }
    ));
    assert!(result.recommended.is_some());
    assert!(result.example_snippet.is_none());
}

#[test]
fn scenario_tight_cpu_limit() {
    let spec = governed("batch", 100, 512);
    let usage = UsageSnapshot::Available(vec![sample("batch", 95, 300 * MIB)]);

    let results = analyze(
        std::slice::from_ref(&spec),
        &usage,
        Threshold::new(0.9).unwrap(),
    );
    assert_eq!(results[0].risk, RiskTier::Medium);
    assert!(results[0].suggestions.iter().any(|s| matches!(
        s,
        Suggestion::IncreaseLimit {
            resource: ResourceName::Cpu,
            ..
        }
    )));

    // A looser suggestion threshold silences the advice but not the risk
    let results = analyze(&[spec], &usage, Threshold::new(1.0).unwrap());
    assert_eq!(results[0].risk, RiskTier::Medium);
    assert!(!results[0].suggestions.iter().any(|s| matches!(
        s,
        Suggestion::IncreaseLimit {
            resource: ResourceName::Cpu,
            ..
        }
    )));
}

#[test]
fn scenario_no_limits_with_small_usage_gets_floored_snippet() {
    let usage = UsageSnapshot::Available(vec![sample("worker", 10, 10 * MIB)]);
    let results = analyze(&[bare("worker")], &usage, Threshold::default());
    let result = &results[0];

    assert_eq!(result.risk, RiskTier::High);
    let rec = result.recommended.as_ref().unwrap();
    assert_eq!(rec.cpu_limit, "100m");
    assert_eq!(rec.cpu_request, "50m");
    assert_eq!(rec.memory_limit, "128Mi");
    assert_eq!(rec.memory_request, "64Mi");

    let snippet = result.example_snippet.as_deref().unwrap();
    for value in ["\"100m\"", "\"50m\"", "\"128Mi\"", "\"64Mi\""] {
        assert!(snippet.contains(value), "snippet missing {}", value);
    }
}

#[test]
fn test_output_matches_input_order_and_length() {
    let specs = vec![
        governed("c", 100, 128),
        bare("a"),
        governed("b", 500, 1024),
        bare("a2"),
    ];
    let usage = UsageSnapshot::Available(vec![sample("b", 10, MIB), sample("a", 10, MIB)]);
    let results = analyze(&specs, &usage, Threshold::default());

    assert_eq!(results.len(), specs.len());
    for (spec, result) in specs.iter().zip(&results) {
        assert_eq!(spec.key, result.key);
    }
}

#[test]
fn test_join_is_exact_and_ignores_extra_samples() {
    let specs = vec![bare("web")];
    let usage = UsageSnapshot::Available(vec![
        // Same workload, other container
        UsageSample::new(key("web", "sidecar"), ResourceUsage::new(10, MIB)),
        // Same names, other namespace
        UsageSample::new(
            ContainerKey::new("other", "web", "app"),
            ResourceUsage::new(10, MIB),
        ),
        sample("gone", 10, MIB),
    ]);

    let results = analyze(&specs, &usage, Threshold::default());
    assert!(results[0].current_usage.is_none());
    assert!(results[0].recommended.is_none());
}

#[test]
fn test_later_sample_for_same_container_wins() {
    let specs = vec![bare("web")];
    let usage = UsageSnapshot::Available(vec![
        sample("web", 10, MIB),
        sample("web", 80, 100 * MIB),
    ]);

    let results = analyze(&specs, &usage, Threshold::default());
    assert_eq!(
        results[0].current_usage,
        Some(ResourceUsage::new(80, 100 * MIB))
    );
}

#[test]
fn test_unavailable_usage_degrades_to_spec_only() {
    let specs = vec![bare("web"), governed("api", 100, 128)];
    let fetched_nothing = analyze(&specs, &UsageSnapshot::default(), Threshold::default());
    let fetch_failed = analyze(
        &specs,
        &UsageSnapshot::unavailable("connection refused"),
        Threshold::default(),
    );

    assert_eq!(fetched_nothing, fetch_failed);
    assert!(fetch_failed.iter().all(|r| r.current_usage.is_none()));
    assert_eq!(fetch_failed[0].risk, RiskTier::High);
    assert_eq!(fetch_failed[1].risk, RiskTier::Low);
}

#[test]
fn test_recommendations_gate_on_usage_only() {
    let usage = UsageSnapshot::Available(vec![sample("api", 200, 200 * MIB)]);
    let results = analyze(&[governed("api", 1000, 1024)], &usage, Threshold::default());

    // Limits present: recommendations but no snippet
    assert_eq!(
        results[0].recommended.as_ref().map(|r| r.cpu_limit.as_str()),
        Some("500m")
    );
    assert!(results[0].example_snippet.is_none());
}

#[test]
fn test_analysis_is_repeatable() {
    let specs = vec![bare("web"), governed("api", 100, 128), governed("db", 2000, 4096)];
    let usage = UsageSnapshot::Available(vec![sample("web", 30, 40 * MIB), sample("api", 99, MIB)]);
    let analyzer = Analyzer::new(Threshold::new(0.7).unwrap());

    let first = serde_json::to_string(&analyzer.analyze(&specs, &usage)).unwrap();
    let second = serde_json::to_string(&analyzer.analyze(&specs, &usage)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_threshold_rejects_out_of_range() {
    assert!(Threshold::new(0.0).is_err());
    assert!(Threshold::new(-0.5).is_err());
    assert!(Threshold::new(1.01).is_err());
    assert!(Threshold::new(f64::NAN).is_err());
    assert_eq!(Threshold::new(1.0).unwrap().get(), 1.0);
    assert_eq!(Threshold::default().get(), DEFAULT_THRESHOLD);
}

#[test]
fn test_result_serialization_shape() {
    let usage = UsageSnapshot::Available(vec![sample("worker", 10, 10 * MIB)]);
    let results = analyze(&[bare("worker")], &usage, Threshold::default());
    let json = serde_json::to_value(&results[0]).unwrap();

    assert_eq!(json["namespace"], "default");
    assert_eq!(json["workload"], "worker");
    assert_eq!(json["container"], "app");
    assert_eq!(json["age"], "1h");
    assert_eq!(json["risk"], "HIGH");
    assert_eq!(json["suggestions"][0], "No resource limits set");
    assert_eq!(json["recommended"]["memory_limit"], "128Mi");
    assert!(json["example_snippet"].is_string());

    let without_usage = analyze(&[bare("web")], &UsageSnapshot::default(), Threshold::default());
    let json = serde_json::to_value(&without_usage[0]).unwrap();
    assert!(json.get("recommended").is_none());
    assert!(json["current_usage"].is_null());
}
