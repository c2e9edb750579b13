// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # nodeweave-observability
//!
//! Logging setup shared by nodeweave binaries and tests, with per-crate debug flag support.
//! Library crates only emit `tracing` events; installing a subscriber is left to the application
//! through [`init_logging`].
//!
//! ## Features
//! - `file-logging`: JSON log files in timestamped run folders (desktop only)

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

pub use cli::*;
pub use init::*;

/// Crate names accepted by `--debug-<crate>` and `NODEWEAVE_DEBUG`
pub const KNOWN_CRATES: &[&str] = &[
    "nodeweave",
    "nodeweave-structures",
    "nodeweave-serialization",
    "nodeweave-config",
    "nodeweave-observability",
];
