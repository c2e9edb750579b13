// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! CLI argument parsing for per-crate debug flags
//!
//! Supports flags like `--debug-nodeweave-serialization` to raise one crate to debug level
//! without touching the others.

use std::collections::BTreeSet;
use std::env;

use crate::KNOWN_CRATES;

/// Crates whose events should be logged at debug level
///
/// # Example
/// ```rust
/// use nodeweave_observability::CrateDebugFlags;
///
/// let flags = CrateDebugFlags::from_args(vec!["--debug-nodeweave-serialization".to_string()]);
/// assert!(flags.is_enabled("nodeweave-serialization"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrateDebugFlags {
    pub enabled_crates: BTreeSet<String>,
}

impl CrateDebugFlags {
    /// Looks for arguments matching `--debug-{crate-name}`, and `--debug-all` for every known crate
    pub fn from_args<I>(args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut flags = CrateDebugFlags::default();
        for arg in args {
            if arg == "--debug-all" {
                flags.enable_all();
            } else if let Some(crate_name) = arg.strip_prefix("--debug-") {
                flags.enabled_crates.insert(crate_name.to_string());
            }
        }
        flags
    }

    /// Adds the crates named by a `NODEWEAVE_DEBUG` style value: `all` or a comma-separated list
    pub fn merge_env_value(&mut self, value: &str) {
        if value.trim() == "all" {
            self.enable_all();
            return;
        }
        for crate_name in value.split(',') {
            let crate_name = crate_name.trim();
            if !crate_name.is_empty() {
                self.enabled_crates.insert(crate_name.to_string());
            }
        }
    }

    fn enable_all(&mut self) {
        self.enabled_crates
            .extend(KNOWN_CRATES.iter().map(|name| name.to_string()));
    }

    pub fn is_enabled(&self, crate_name: &str) -> bool {
        self.enabled_crates.contains(crate_name)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled_crates.is_empty()
    }

    /// `DEBUG` for enabled crates, `default_level` otherwise
    pub fn log_level(&self, crate_name: &str, default_level: tracing::Level) -> tracing::Level {
        if self.is_enabled(crate_name) {
            tracing::Level::DEBUG
        } else {
            default_level
        }
    }

    /// Builds an `EnvFilter` directive string, e.g. `nodeweave_serialization=debug,warn`.
    ///
    /// Tracing targets are module paths, so crate names are written with underscores.
    pub fn to_filter_string(&self, default_level: &str) -> String {
        let default_level = default_level.to_lowercase();
        if self.enabled_crates.is_empty() {
            return default_level;
        }
        let mut filters: Vec<String> = self
            .enabled_crates
            .iter()
            .map(|crate_name| format!("{}=debug", crate_name.replace('-', "_")))
            .collect();
        filters.push(default_level);
        filters.join(",")
    }
}

/// Debug flags from the process arguments and the `NODEWEAVE_DEBUG` environment variable
pub fn parse_debug_flags() -> CrateDebugFlags {
    let mut flags = CrateDebugFlags::from_args(env::args());
    if let Ok(value) = env::var("NODEWEAVE_DEBUG") {
        flags.merge_env_value(&value);
    }
    flags
}

/// Generate help text for debug flags
pub fn debug_flags_help() -> String {
    format!(
        r#"Debug Flags:
  --debug-all                    Enable debug logging for all crates
  --debug-{{crate-name}}          Enable debug logging for specific crate

Available crates:
  {}

Environment Variable:
  NODEWEAVE_DEBUG={{crate-name}}[,{{crate-name}}]  Enable debug for crates (comma-separated)
  NODEWEAVE_DEBUG=all                               Enable debug for all crates
"#,
        KNOWN_CRATES.join(", ")
    )
}
