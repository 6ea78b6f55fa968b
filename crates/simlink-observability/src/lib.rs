// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # simlink-observability
//!
//! Logging setup shared by the simlink crates and binaries, with per-crate
//! debug flag support.
//!
//! ## Features
//! - `file-logging`: Timestamped run folders with JSON log files and retention cleanup

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known simlink crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "simlink",
    "simlink-session",
    "simlink-config",
    "simlink-observability",
    "simlink-cli",
];
