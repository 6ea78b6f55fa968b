// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! Each struct maps to one section of `simlink.toml`. Every field has a
//! default so partial files load.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SimlinkConfig {
    pub service: ServiceConfig,
    pub retry: RetryConfig,
    pub logging: LoggingConfig,
}

/// Remote training service connection
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the service
    pub server: String,
    pub workspace: String,
    pub access_key: String,
    /// Attached to the simulator interface when the simulator sets none
    pub simulator_context: Option<String>,
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: "https://api.bons.ai".to_string(),
            workspace: String::new(),
            access_key: String::new(),
            simulator_context: None,
            request_timeout_secs: 60,
        }
    }
}

/// Transient-failure retry settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Consecutive retries before the session is dropped (0 = infinite)
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff_ms: 1_000,
            max_backoff_ms: 60_000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for file logs; console only when unset
    pub log_dir: Option<PathBuf>,
    pub retention_days: u32,
    pub max_runs: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
            retention_days: 7,
            max_runs: 20,
        }
    }
}
