//! Output formatting utilities

use checker_lib::{ResourceList, ResourceName, RiskTier, Suggestion};
use clap::ValueEnum;
use colored::Colorize;

/// Output format for scan results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

impl OutputFormat {
    /// Machine-readable formats keep stdout free of decoration
    pub fn is_structured(&self) -> bool {
        !matches!(self, Self::Table)
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

pub fn risk_icon(risk: RiskTier) -> &'static str {
    match risk {
        RiskTier::High => "🔴",
        RiskTier::Medium => "🟡",
        RiskTier::Low => "🟢",
    }
}

/// Color risk tier based on severity
pub fn color_risk(risk: RiskTier) -> String {
    let label = format!("{} {}", risk_icon(risk), risk);
    match risk {
        RiskTier::High => label.red().bold().to_string(),
        RiskTier::Medium => label.yellow().to_string(),
        RiskTier::Low => label.green().to_string(),
    }
}

pub fn suggestion_icon(suggestion: &Suggestion) -> &'static str {
    match suggestion {
        Suggestion::MissingLimits => "❌",
        Suggestion::MissingRequests | Suggestion::IncreaseLimit { .. } => "⚠️",
        Suggestion::DecreaseLimit { .. } => "💡",
        Suggestion::SetLimitsFromRequirements => "📋",
    }
}

/// Suggestion prefixed with its icon
pub fn format_suggestion(suggestion: &Suggestion) -> String {
    format!("{} {}", suggestion_icon(suggestion), suggestion)
}

/// Compact limits cell: `CPU:200m, Mem:256Mi`, or `None`
pub fn format_limits(limits: &ResourceList) -> String {
    if limits.is_empty() {
        return "None".to_string();
    }

    limits
        .iter()
        .map(|(name, quantity)| match name {
            ResourceName::Cpu => format!("CPU:{}", quantity),
            ResourceName::Memory => format!("Mem:{}", quantity),
            ResourceName::Other(other) => format!("{}:{}", other, quantity),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2}Gi", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2}Mi", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2}Ki", bytes as f64 / KB as f64)
    } else {
        format!("{}B", bytes)
    }
}

/// Format millicores as human-readable string
pub fn format_cpu(millicores: u64) -> String {
    if millicores >= 1000 {
        format!("{:.1}", millicores as f64 / 1000.0)
    } else {
        format!("{}m", millicores)
    }
}
