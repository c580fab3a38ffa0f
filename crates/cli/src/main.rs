//! Pod Limit Checker CLI
//!
//! Scans a Kubernetes cluster for containers without resource limits,
//! grades each container by risk, and suggests limits sized from current
//! usage when the metrics-server is available.

mod client;
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CheckerConfig, Settings};
use crate::output::OutputFormat;

/// Pod Limit Checker
#[derive(Parser, Debug)]
#[command(name = "pod-limit-checker")]
#[command(
    author,
    version,
    about = "Pod Limit Checker: find containers without resource limits and suggest safe values",
    long_about = None
)]
pub struct Cli {
    /// Path to kubeconfig file (inferred if not specified)
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Namespace to check (all namespaces if not specified)
    #[arg(long, short)]
    pub namespace: Option<String>,

    /// Output format
    #[arg(long, short)]
    pub output: Option<OutputFormat>,

    /// Usage fraction of a limit above which an increase is suggested, in (0, 1]
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Show all containers, including those with proper limits
    #[arg(long)]
    pub all: bool,

    /// Show detailed recommendations for every container
    #[arg(long, short)]
    pub verbose: bool,

    /// Don't show specific fixes and example YAML
    #[arg(long)]
    pub no_examples: bool,

    /// Suppress progress messages and warnings
    #[arg(long, short)]
    pub quiet: bool,

    /// Seconds to wait for each API before giving up
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write scan metrics in Prometheus text format to this file
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Configuration file (default: ~/.config/pod-limit-checker/config.json)
    #[arg(long, env = "PLC_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Initialize logging to stderr so stdout stays parseable
fn init_tracing(quiet: bool, json: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CheckerConfig::load(cli.config.as_deref())?;
    let settings = Settings::resolve(&cli, config)?;

    init_tracing(settings.quiet, cli.log_json);

    commands::check::run(&settings).await
}
