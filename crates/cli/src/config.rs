//! Configuration management for the CLI
//!
//! Settings are layered: defaults, then the optional config file, then
//! `PLC_*` environment variables, then command-line flags.

use anyhow::{anyhow, Context, Result};
use checker_lib::{Threshold, DEFAULT_FETCH_TIMEOUT};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::commands::check::ReportOptions;
use crate::output::OutputFormat;
use crate::Cli;

/// Prefix for environment overrides, e.g. `PLC_THRESHOLD=0.9`
const ENV_PREFIX: &str = "PLC";

/// Values read from the config file and environment
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CheckerConfig {
    /// Usage fraction above which a limit increase is suggested
    pub threshold: Option<f64>,
    /// Namespace to scan (all namespaces when unset)
    pub namespace: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Seconds each source has to answer
    pub fetch_timeout_secs: Option<u64>,
    /// Kubeconfig context
    pub context: Option<String>,
    /// Kubeconfig path
    pub kubeconfig: Option<PathBuf>,
}

impl CheckerConfig {
    /// Load from `path` (required) or the default location (optional),
    /// with environment overrides applied on top
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => Some(config::File::from(path).required(true)),
            None => Self::config_path().map(|path| config::File::from(path).required(false)),
        };

        let mut builder = config::Config::builder();
        if let Some(file) = file {
            builder = builder.add_source(file);
        }

        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("Failed to load configuration")?
            .try_deserialize()
            .context("Failed to parse configuration")
    }

    /// Get the configuration file path
    pub fn config_path() -> Option<PathBuf> {
        dirs_next::home_dir().map(|home| {
            home.join(".config")
                .join("pod-limit-checker")
                .join("config.json")
        })
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub namespace: Option<String>,
    pub format: OutputFormat,
    pub threshold: Threshold,
    pub fetch_timeout: Duration,
    pub show_all: bool,
    pub verbose: bool,
    pub show_examples: bool,
    pub quiet: bool,
    pub metrics_file: Option<PathBuf>,
}

impl Settings {
    /// Merge flags over file/environment values over defaults
    pub fn resolve(cli: &Cli, config: CheckerConfig) -> Result<Self> {
        let format = match (cli.output, config.output.as_deref()) {
            (Some(format), _) => format,
            (None, Some(name)) => OutputFormat::from_str(name, true)
                .map_err(|e| anyhow!("Invalid output format in configuration: {}", e))?,
            (None, None) => OutputFormat::default(),
        };

        let threshold = match cli.threshold.or(config.threshold) {
            Some(value) => Threshold::new(value).context("Invalid threshold")?,
            None => Threshold::default(),
        };

        let fetch_timeout = cli
            .timeout_secs
            .or(config.fetch_timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_FETCH_TIMEOUT);
        if fetch_timeout.is_zero() {
            return Err(anyhow!("Fetch timeout must be at least one second"));
        }

        Ok(Self {
            kubeconfig: cli.kubeconfig.clone().or(config.kubeconfig),
            context: cli.context.clone().or(config.context),
            namespace: cli.namespace.clone().or(config.namespace),
            format,
            threshold,
            fetch_timeout,
            show_all: cli.all,
            verbose: cli.verbose,
            show_examples: !cli.no_examples,
            quiet: cli.quiet || format.is_structured(),
            metrics_file: cli.metrics_file.clone(),
        })
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            format: self.format,
            show_all: self.show_all,
            verbose: self.verbose,
            show_examples: self.show_examples,
        }
    }
}
