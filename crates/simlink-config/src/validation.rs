// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! Checks that values are present, within range, and consistent with each other
//! before a session is attempted.

use crate::{ConfigError, ConfigResult, SimlinkConfig};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
        }
    }
}

/// Validate the complete configuration
///
/// Checks for:
/// - Required fields (workspace, access key)
/// - Server URL scheme
/// - Positive request timeout
/// - Retry backoff not above its cap
/// - Known log level
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &SimlinkConfig) -> ConfigResult<()> {
    let mut errors = Vec::new();

    validate_required_fields(config, &mut errors);
    validate_value_ranges(config, &mut errors);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

fn validate_required_fields(config: &SimlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("service.server", &config.service.server),
        ("service.workspace", &config.service.workspace),
        ("service.access_key", &config.service.access_key),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }
}

fn validate_value_ranges(config: &SimlinkConfig, errors: &mut Vec<ConfigValidationError>) {
    let server = config.service.server.trim();
    if !server.is_empty() && !(server.starts_with("http://") || server.starts_with("https://")) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "service.server".to_string(),
            reason: format!("'{}' must start with http:// or https://", server),
        });
    }

    if config.service.request_timeout_secs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "service.request_timeout_secs".to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    if config.retry.base_backoff_ms > config.retry.max_backoff_ms {
        errors.push(ConfigValidationError::InvalidValue {
            field: "retry.base_backoff_ms".to_string(),
            reason: format!(
                "{} exceeds retry.max_backoff_ms ({})",
                config.retry.base_backoff_ms, config.retry.max_backoff_ms
            ),
        });
    }

    let level = config.logging.level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!(
                "'{}' is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }
}
