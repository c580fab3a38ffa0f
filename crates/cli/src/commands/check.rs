//! The limit check: scan the cluster and report findings

use anyhow::{Context, Result};
use checker_lib::{
    format_age, AnalysisResult, Analyzer, ResourceName, ScanLogger, ScanMetrics, ScanReport,
    Scanner,
};
use std::fmt::{self, Write};
use std::path::Path;
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

use crate::client::KubeClient;
use crate::config::Settings;
use crate::output::{
    color_risk, format_bytes, format_cpu, format_limits, format_suggestion, print_info,
    print_success, risk_icon, OutputFormat,
};

/// Row for the compact findings table
#[derive(Tabled)]
struct FindingRow {
    #[tabled(rename = "Namespace")]
    namespace: String,
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Age")]
    age: String,
    #[tabled(rename = "Limits")]
    limits: String,
    #[tabled(rename = "Requests")]
    requests: String,
    #[tabled(rename = "Risk")]
    risk: String,
    #[tabled(rename = "Suggestions")]
    suggestions: String,
}

impl From<&AnalysisResult> for FindingRow {
    fn from(result: &AnalysisResult) -> Self {
        let suggestions = match result.headline() {
            Some(first) if result.suggestions.len() > 1 => {
                format!("{} (+{} more)", first, result.suggestions.len() - 1)
            }
            Some(first) => first.to_string(),
            None => String::new(),
        };

        Self {
            namespace: result.key.namespace.clone(),
            pod: result.key.workload.clone(),
            container: result.key.container.clone(),
            age: format_age(result.age),
            limits: format_limits(&result.current_limits),
            requests: if result.has_requests { "Yes" } else { "No" }.to_string(),
            risk: color_risk(result.risk),
            suggestions,
        }
    }
}

/// How findings are presented
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub format: OutputFormat,
    pub show_all: bool,
    pub verbose: bool,
    pub show_examples: bool,
}

/// Run a scan against the configured cluster and print the report
pub async fn run(settings: &Settings) -> Result<()> {
    if !settings.quiet {
        match &settings.namespace {
            Some(ns) => print_info(&format!("Checking pods in namespace {}", ns)),
            None => print_info("Checking pods across all namespaces"),
        }
    }

    let client = KubeClient::connect(settings.kubeconfig.as_deref(), settings.context.as_deref())
        .await?;

    let scanner = Scanner::new(
        Arc::new(client.workloads()),
        Arc::new(client.metrics()),
        Analyzer::new(settings.threshold),
    )
    .with_fetch_timeout(settings.fetch_timeout)
    .with_logger(ScanLogger::new(client.cluster()));

    let report = scanner
        .run(settings.namespace.as_deref())
        .await
        .context("Failed to scan workloads")?;

    if let Some(path) = &settings.metrics_file {
        write_metrics(&report, path)?;
    }

    print!("{}", render(&report, &settings.report_options())?);

    if let Some(path) = &settings.metrics_file {
        if !settings.quiet {
            print_success(&format!("Metrics written to {}", path.display()));
        }
    }

    Ok(())
}

/// Write the scan metrics in the Prometheus text format
fn write_metrics(report: &ScanReport, path: &Path) -> Result<()> {
    let metrics = ScanMetrics::new().context("Failed to create metrics registry")?;
    metrics.record(report);
    let text = metrics.encode_text().context("Failed to encode metrics")?;
    std::fs::write(path, text)
        .with_context(|| format!("Failed to write metrics to {}", path.display()))
}

/// Results worth showing: no limits, or an elevated risk tier
pub fn select(results: &[AnalysisResult], show_all: bool) -> Vec<&AnalysisResult> {
    results
        .iter()
        .filter(|r| show_all || !r.has_limits || r.risk.is_at_risk())
        .collect()
}

/// Render a report in the requested format
pub fn render(report: &ScanReport, options: &ReportOptions) -> Result<String> {
    let shown = select(&report.results, options.show_all);

    match options.format {
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(&shown).context("Failed to serialize results")?;
            json.push('\n');
            Ok(json)
        }
        OutputFormat::Yaml => serde_yaml::to_string(&shown).context("Failed to serialize results"),
        OutputFormat::Table => {
            render_table(report, shown, options).context("Failed to render table")
        }
    }
}

fn render_table(
    report: &ScanReport,
    mut shown: Vec<&AnalysisResult>,
    options: &ReportOptions,
) -> Result<String, fmt::Error> {
    let mut out = String::new();

    if shown.is_empty() {
        out.push_str("✅ All pods have proper resource limits configured.\n");
        return Ok(out);
    }

    // Stable, so source order is kept within a tier
    shown.sort_by_key(|r| r.risk);

    if options.verbose {
        for (i, result) in shown.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            write_details(&mut out, result, options.show_examples)?;
        }
    } else {
        let rows: Vec<FindingRow> = shown.iter().map(|r| FindingRow::from(*r)).collect();
        let table = Table::new(rows).with(Style::rounded()).to_string();
        writeln!(out, "{}", table)?;
    }

    write_summary(&mut out, report, shown.len())?;

    if options.show_examples {
        write_fixes(&mut out, &shown)?;
    }

    if !options.verbose {
        out.push_str("\n💡 Tip: Use --verbose flag to see detailed recommendations\n");
    }

    Ok(out)
}

fn write_details(out: &mut String, result: &AnalysisResult, show_examples: bool) -> fmt::Result {
    let key = &result.key;
    writeln!(out, "📦 Pod: {}/{}", key.namespace, key.workload)?;
    writeln!(
        out,
        "  Container: {} (Age: {})",
        key.container,
        format_age(result.age)
    )?;

    writeln!(out, "  Current configuration:")?;
    if result.has_limits {
        writeln!(out, "    Limits:")?;
        for name in [ResourceName::Cpu, ResourceName::Memory] {
            match result.current_limits.get(&name) {
                Some(quantity) => {
                    writeln!(out, "      {}: {}", name.label(), quantity)?;
                }
                None => {
                    writeln!(out, "      {}: ❌ Not set", name.label())?;
                }
            }
        }
    } else {
        writeln!(out, "    Limits: ❌ None")?;
    }
    if result.has_requests {
        writeln!(out, "    Requests: ✅ Set")?;
    } else {
        writeln!(out, "    Requests: ⚠️ Not set")?;
    }

    if let Some(usage) = &result.current_usage {
        writeln!(out, "  Current usage:")?;
        writeln!(out, "    CPU: {}", format_cpu(usage.cpu_millicores))?;
        writeln!(out, "    Memory: {}", format_bytes(usage.memory_bytes))?;
    }

    writeln!(out, "  Risk level: {}{}", risk_icon(result.risk), result.risk)?;

    if !result.suggestions.is_empty() {
        writeln!(out, "  Suggestions:")?;
        for suggestion in &result.suggestions {
            writeln!(out, "    - {}", format_suggestion(suggestion))?;
        }
    }

    if let Some(recommended) = &result.recommended {
        writeln!(out, "  Recommended limits (based on current usage):")?;
        writeln!(
            out,
            "    CPU: {} (request: {})",
            recommended.cpu_limit, recommended.cpu_request
        )?;
        writeln!(
            out,
            "    Memory: {} (request: {})",
            recommended.memory_limit, recommended.memory_request
        )?;
        if let Some(snippet) = result.example_snippet.as_ref().filter(|_| show_examples) {
            writeln!(out, "  Example YAML to add to container spec:")?;
            writeln!(out, "{}", snippet)?;
        }
    }
    Ok(())
}

fn write_summary(out: &mut String, report: &ScanReport, shown: usize) -> fmt::Result {
    let summary = report.summary();

    writeln!(out, "\n📊 Summary:")?;
    writeln!(out, "  Total containers analyzed: {}", summary.total)?;
    writeln!(out, "  🔴 High risk (no limits): {}", summary.high_risk)?;
    writeln!(out, "  🟡 Medium risk: {}", summary.medium_risk)?;
    writeln!(out, "  🟢 Low risk: {}", summary.low_risk)?;
    writeln!(out, "  ❌ No limits set: {}", summary.without_limits)?;
    writeln!(out, "  ⚠️  No requests set: {}", summary.without_requests)?;
    writeln!(out, "  📊 With usage metrics: {}", summary.with_usage)?;

    let hidden = summary.total - shown;
    if hidden > 0 {
        writeln!(out, "  ({} low-risk containers hidden, use --all to show)", hidden)?;
    }
    if let Some(reason) = &report.usage_error {
        writeln!(out, "  ⚠️  Usage metrics unavailable: {}", reason)?;
    }
    Ok(())
}

fn write_fixes(out: &mut String, shown: &[&AnalysisResult]) -> fmt::Result {
    let needing_fixes: Vec<_> = shown
        .iter()
        .filter(|r| !r.has_limits)
        .filter_map(|r| Some((*r, r.current_usage?, r.recommended.as_ref()?)))
        .collect();

    if needing_fixes.is_empty() {
        return Ok(());
    }

    writeln!(
        out,
        "\n🔧 Specific fixes for pods without limits (based on current usage):"
    )?;
    for (result, usage, recommended) in needing_fixes {
        writeln!(out, "\n  {}:", result.key)?;
        writeln!(
            out,
            "    Current CPU usage: {} → Suggested: limit={}, request={}",
            format_cpu(usage.cpu_millicores),
            recommended.cpu_limit,
            recommended.cpu_request
        )?;
        writeln!(
            out,
            "    Current memory usage: {} → Suggested: limit={}, request={}",
            format_bytes(usage.memory_bytes),
            recommended.memory_limit,
            recommended.memory_request
        )?;
    }
    Ok(())
}
