// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Installs a global `tracing` subscriber: a console layer in text or JSON format and, with the
//! `file-logging` feature, a JSON log file inside a timestamped run folder.

use anyhow::{Context, Result};
use nodeweave_config::LoggingConfig;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::cli::CrateDebugFlags;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps background log writers alive; drop it at the end of `main` to flush
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder the log files are written to, when file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

/// Builds the filter for the configured level, raised to debug for flagged crates
pub fn build_filter(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<EnvFilter> {
    let level: tracing::Level = config
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.level))?;
    let directives = debug_flags.to_filter_string(&level.to_string());
    EnvFilter::try_new(&directives).with_context(|| format!("Invalid log filter '{}'", directives))
}

fn console_layer(config: &LoggingConfig, filter: EnvFilter) -> BoxedLayer {
    if config.is_json() {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .json()
            .with_filter(filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_file(false)
            .with_line_number(false)
            .with_filter(filter)
            .boxed()
    }
}

/// Initialize console logging
///
/// # Errors
///
/// Fails on an unknown level or when a global subscriber is already installed.
pub fn init_logging(debug_flags: &CrateDebugFlags, config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = build_filter(debug_flags, config)?;
    Registry::default()
        .with(vec![console_layer(config, filter)])
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    Ok(LoggingGuard {
        #[cfg(feature = "file-logging")]
        _file_guards: Vec::new(),
        log_dir: None,
    })
}

/// Initialize console logging plus a JSON log file
///
/// Creates a timestamped folder structure:
/// ```text
/// ./logs/
///   └── run_20250101_120000/
///       └── nodeweave.log
/// ```
///
/// * `log_dir` - Base directory for logs (default: `./logs`)
/// * `retention_days` - Keep runs for N days (default: 30)
/// * `retention_runs` - Keep the N most recent runs (default: 10)
#[cfg(feature = "file-logging")]
pub fn init_file_logging(
    debug_flags: &CrateDebugFlags,
    config: &LoggingConfig,
    log_dir: Option<PathBuf>,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<LoggingGuard> {
    use chrono::Utc;
    use tracing_appender::rolling;

    let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));
    let run_folder = base_log_dir.join(format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S")));
    std::fs::create_dir_all(&run_folder)
        .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;
    cleanup_old_logs(&base_log_dir, &run_folder, retention_days, retention_runs)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(rolling::never(&run_folder, "nodeweave.log"));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .json()
        .with_filter(build_filter(debug_flags, config)?)
        .boxed();

    let layers: Vec<BoxedLayer> = vec![console_layer(config, build_filter(debug_flags, config)?), file_layer];
    Registry::default()
        .with(layers)
        .try_init()
        .context("Failed to install the global tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guards: vec![guard],
        log_dir: Some(run_folder),
    })
}

/// Removes run folders older than `retention_days`, then the oldest ones beyond `retention_runs`.
/// `current_run` is never removed.
#[cfg(feature = "file-logging")]
fn cleanup_old_logs(
    base_log_dir: &Path,
    current_run: &Path,
    retention_days: Option<u64>,
    retention_runs: Option<usize>,
) -> Result<()> {
    use chrono::{DateTime, NaiveDateTime, Utc};

    let retention_days = retention_days.unwrap_or(30);
    let retention_runs = retention_runs.unwrap_or(10);
    let cutoff_date = Utc::now() - chrono::Duration::days(retention_days as i64);

    let mut runs: Vec<(PathBuf, DateTime<Utc>)> = Vec::new();
    for entry in std::fs::read_dir(base_log_dir)? {
        let path = entry?.path();
        if !path.is_dir() || path == current_run {
            continue;
        }
        let timestamp = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("run_"))
            .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, "%Y%m%d_%H%M%S").ok());
        if let Some(timestamp) = timestamp {
            runs.push((path, timestamp.and_utc()));
        }
    }
    runs.sort_by_key(|(_, timestamp)| *timestamp);

    // the current run counts towards the limit
    let keep = retention_runs.saturating_sub(1);
    let over_limit = runs.len().saturating_sub(keep);
    for (index, (path, timestamp)) in runs.iter().enumerate() {
        if index < over_limit || *timestamp < cutoff_date {
            if let Err(e) = std::fs::remove_dir_all(path) {
                tracing::warn!("Failed to remove old log directory {}: {}", path.display(), e);
            }
        }
    }
    Ok(())
}
