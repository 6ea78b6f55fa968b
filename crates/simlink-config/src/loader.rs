// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Three tiers, later ones winning:
//! 1. TOML file (optional when discovered, required when given explicitly)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, SimlinkConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// File name searched for during discovery
pub const CONFIG_FILE_NAME: &str = "simlink.toml";

/// Find the simlink configuration file
///
/// Search order:
/// 1. `SIMLINK_CONFIG_PATH` environment variable
/// 2. Current working directory: `./simlink.toml`
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("SIMLINK_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        } else {
            return Err(ConfigError::FileNotFound(format!(
                "Config file specified by SIMLINK_CONFIG_PATH not found: {}",
                path.display()
            )));
        }
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));
        search_paths.extend(
            cwd.ancestors()
                .skip(1)
                .take(5)
                .map(|dir| dir.join(CONFIG_FILE_NAME)),
        );
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet SIMLINK_CONFIG_PATH environment variable to specify custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration
///
/// # Arguments
///
/// * `config_path` - Optional path to config file. If `None`, the file is
///   searched for and defaults are used when none exists.
/// * `cli_args` - Optional CLI argument overrides keyed by dotted path
///
/// # Errors
///
/// Returns error if an explicit config file is missing or contains invalid TOML
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<SimlinkConfig> {
    let config_file = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => match find_config_file() {
            Ok(path) => Some(path),
            Err(ConfigError::FileNotFound(_)) if env::var("SIMLINK_CONFIG_PATH").is_err() => None,
            Err(e) => return Err(e),
        },
    };

    let mut config = match config_file {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => SimlinkConfig::default(),
    };

    apply_environment_overrides(&mut config);

    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli)?;
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `SIM_WORKSPACE` -> `service.workspace`
/// - `SIM_ACCESS_KEY` -> `service.access_key`
/// - `SIM_API_HOST` -> `service.server`
/// - `SIM_CONTEXT` -> `service.simulator_context`
/// - `SIMLINK_MAX_RETRY_ATTEMPTS` -> `retry.max_attempts`
/// - `SIMLINK_RETRY_BACKOFF_MS` -> `retry.base_backoff_ms`
/// - `SIMLINK_LOG_LEVEL` -> `logging.level`
///
/// Unparseable numeric values are ignored.
pub fn apply_environment_overrides(config: &mut SimlinkConfig) {
    if let Ok(value) = env::var("SIM_WORKSPACE") {
        config.service.workspace = value;
    }
    if let Ok(value) = env::var("SIM_ACCESS_KEY") {
        config.service.access_key = value;
    }
    if let Ok(value) = env::var("SIM_API_HOST") {
        config.service.server = value;
    }
    if let Ok(value) = env::var("SIM_CONTEXT") {
        config.service.simulator_context = Some(value);
    }

    if let Ok(value) = env::var("SIMLINK_MAX_RETRY_ATTEMPTS") {
        if let Ok(attempts) = value.parse::<u32>() {
            config.retry.max_attempts = attempts;
        }
    }
    if let Ok(value) = env::var("SIMLINK_RETRY_BACKOFF_MS") {
        if let Ok(backoff) = value.parse::<u64>() {
            config.retry.base_backoff_ms = backoff;
        }
    }

    if let Ok(value) = env::var("SIMLINK_LOG_LEVEL") {
        config.logging.level = value;
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue(format!("{} = {:?}", key, value)))
}

/// Apply CLI argument overrides to configuration
///
/// # Arguments
///
/// * `config` - Configuration to modify
/// * `cli_args` - Dotted keys, e.g. `{"service.workspace": "ws", "retry.max_attempts": "3"}`
///
/// # Errors
///
/// Unknown keys and unparseable values are rejected, since they were typed by the user.
pub fn apply_cli_overrides(
    config: &mut SimlinkConfig,
    cli_args: &HashMap<String, String>,
) -> ConfigResult<()> {
    for (key, value) in cli_args {
        match key.as_str() {
            "service.server" => config.service.server = value.clone(),
            "service.workspace" => config.service.workspace = value.clone(),
            "service.access_key" => config.service.access_key = value.clone(),
            "service.simulator_context" => {
                config.service.simulator_context = Some(value.clone())
            }
            "service.request_timeout_secs" => {
                config.service.request_timeout_secs = parse(key, value)?
            }
            "retry.max_attempts" => config.retry.max_attempts = parse(key, value)?,
            "retry.base_backoff_ms" => config.retry.base_backoff_ms = parse(key, value)?,
            "retry.max_backoff_ms" => config.retry.max_backoff_ms = parse(key, value)?,
            "logging.level" => config.logging.level = value.clone(),
            "logging.log_dir" => config.logging.log_dir = Some(PathBuf::from(value)),
            other => {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown configuration key: {}",
                    other
                )))
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "SIM_WORKSPACE",
        "SIM_ACCESS_KEY",
        "SIM_API_HOST",
        "SIM_CONTEXT",
        "SIMLINK_MAX_RETRY_ATTEMPTS",
        "SIMLINK_RETRY_BACKOFF_MS",
        "SIMLINK_LOG_LEVEL",
        "SIMLINK_CONFIG_PATH",
    ];

    fn clear_env() -> Vec<(&'static str, String)> {
        let saved = ENV_KEYS
            .iter()
            .filter_map(|k| env::var(k).ok().map(|v| (*k, v)))
            .collect();
        for key in ENV_KEYS {
            env::remove_var(key);
        }
        saved
    }

    fn restore_env(saved: Vec<(&'static str, String)>) {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
        for (key, value) in saved {
            env::set_var(key, value);
        }
    }

    #[test]
    fn test_find_config_file_env_var() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("custom.toml");
        File::create(&config_path).unwrap();

        env::set_var("SIMLINK_CONFIG_PATH", config_path.to_str().unwrap());
        let result = find_config_file();
        restore_env(saved);

        assert_eq!(result.unwrap(), config_path);
    }

    #[test]
    fn test_missing_env_path_is_error() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_env();
        let dir = tempdir().unwrap();

        env::set_var("SIMLINK_CONFIG_PATH", dir.path().join("absent.toml"));
        let result = load_config(None, None);
        restore_env(saved);

        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_minimal_config() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[service]").unwrap();
        writeln!(file, "workspace = \"file-ws\"").unwrap();
        writeln!(file, "[retry]").unwrap();
        writeln!(file, "max_attempts = 8").unwrap();

        let config = load_config(Some(&config_path), None);
        restore_env(saved);
        let config = config.unwrap();

        assert_eq!(config.service.workspace, "file-ws");
        assert_eq!(config.retry.max_attempts, 8);
        assert_eq!(config.retry.max_backoff_ms, 60_000);
    }

    #[test]
    fn test_environment_overrides() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_env();
        let mut config = SimlinkConfig::default();

        env::set_var("SIM_WORKSPACE", "env-ws");
        env::set_var("SIM_ACCESS_KEY", "env-key");
        env::set_var("SIM_API_HOST", "http://127.0.0.1:9000");
        env::set_var("SIM_CONTEXT", "ctx");
        env::set_var("SIMLINK_MAX_RETRY_ATTEMPTS", "not-a-number");
        env::set_var("SIMLINK_RETRY_BACKOFF_MS", "250");

        apply_environment_overrides(&mut config);
        restore_env(saved);

        assert_eq!(config.service.workspace, "env-ws");
        assert_eq!(config.service.access_key, "env-key");
        assert_eq!(config.service.server, "http://127.0.0.1:9000");
        assert_eq!(config.service.simulator_context.as_deref(), Some("ctx"));
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.base_backoff_ms, 250);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = SimlinkConfig::default();
        let mut cli_args = HashMap::new();
        cli_args.insert("service.workspace".to_string(), "cli-ws".to_string());
        cli_args.insert("retry.max_attempts".to_string(), "2".to_string());

        apply_cli_overrides(&mut config, &cli_args).unwrap();

        assert_eq!(config.service.workspace, "cli-ws");
        assert_eq!(config.retry.max_attempts, 2);
    }

    #[test]
    fn test_cli_rejects_bad_input() {
        let mut config = SimlinkConfig::default();

        let unknown = HashMap::from([("service.port".to_string(), "1".to_string())]);
        assert!(apply_cli_overrides(&mut config, &unknown).is_err());

        let bad = HashMap::from([("retry.max_attempts".to_string(), "-1".to_string())]);
        assert!(matches!(
            apply_cli_overrides(&mut config, &bad),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_override_precedence() {
        let _env_lock = ENV_LOCK.lock().unwrap();
        let saved = clear_env();
        let dir = tempdir().unwrap();
        let config_path = dir.path().join(CONFIG_FILE_NAME);

        let mut file = File::create(&config_path).unwrap();
        writeln!(file, "[service]").unwrap();
        writeln!(file, "workspace = \"file-ws\"").unwrap();
        writeln!(file, "access_key = \"file-key\"").unwrap();

        env::set_var("SIM_WORKSPACE", "env-ws");
        env::set_var("SIM_ACCESS_KEY", "env-key");

        let cli_args = HashMap::from([("service.workspace".to_string(), "cli-ws".to_string())]);
        let config = load_config(Some(&config_path), Some(&cli_args));
        restore_env(saved);
        let config = config.unwrap();

        // CLI wins for workspace, env wins for access key (no CLI override)
        assert_eq!(config.service.workspace, "cli-ws");
        assert_eq!(config.service.access_key, "env-key");
    }
}
