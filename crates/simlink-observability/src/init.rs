// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console logging is always available. The `file-logging` feature adds
//! timestamped run folders holding per-crate and combined JSON logs.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::CrateDebugFlags;

/// Build the filter: `RUST_LOG` when set, otherwise debug flags over `default_level`
pub fn build_env_filter(debug_flags: &CrateDebugFlags, default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(debug_flags.to_filter_string(default_level)))
}

/// Initialize human-readable console logging
///
/// # Errors
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(debug_flags: &CrateDebugFlags, default_level: &str) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_env_filter(debug_flags, default_level))
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(feature = "file-logging")]
pub use file::{cleanup_old_logs, init_logging, LoggingGuard};

#[cfg(feature = "file-logging")]
mod file {
    use super::build_env_filter;
    use crate::cli::CrateDebugFlags;
    use anyhow::{Context, Result};
    use chrono::{NaiveDateTime, Utc};
    use std::path::{Path, PathBuf};
    use tracing_appender::rolling;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::{EnvFilter, Layer, Registry};

    const RUN_PREFIX: &str = "run_";
    const RUN_FORMAT: &str = "%Y%m%d_%H%M%S";

    /// Keeps file writers alive; logs are flushed when dropped
    pub struct LoggingGuard {
        _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
        log_dir: PathBuf,
    }

    impl LoggingGuard {
        /// Run folder for this process
        pub fn log_dir(&self) -> &Path {
            &self.log_dir
        }
    }

    /// Initialize logging with file output and console output
    ///
    /// Creates a timestamped folder structure:
    /// ```text
    /// ./logs/
    ///   └── run_20250101_120000/
    ///       ├── simlink-session.log
    ///       ├── simlink-config.log
    ///       └── simlink.log (combined)
    /// ```
    ///
    /// # Arguments
    /// * `debug_flags` - Per-crate debug flags for filtering
    /// * `default_level` - Level for anything not raised by a flag
    /// * `log_dir` - Base directory for logs (default: `./logs`)
    /// * `retention_days` - Keep logs for N days (default: 7)
    /// * `retention_runs` - Keep N most recent runs (default: 20)
    pub fn init_logging(
        debug_flags: &CrateDebugFlags,
        default_level: &str,
        log_dir: Option<PathBuf>,
        retention_days: Option<u32>,
        retention_runs: Option<usize>,
    ) -> Result<LoggingGuard> {
        let base_log_dir = log_dir.unwrap_or_else(|| PathBuf::from("./logs"));

        let timestamp = Utc::now().format(RUN_FORMAT);
        let run_folder = base_log_dir.join(format!("{}{}", RUN_PREFIX, timestamp));
        std::fs::create_dir_all(&run_folder)
            .with_context(|| format!("Failed to create log directory: {}", run_folder.display()))?;

        cleanup_old_logs(
            &base_log_dir,
            retention_days.unwrap_or(7),
            retention_runs.unwrap_or(20),
        )?;

        let env_filter = build_env_filter(debug_flags, default_level);
        let mut layers = Vec::new();
        let mut file_guards = Vec::new();

        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_filter(env_filter)
            .boxed();
        layers.push(console_layer);

        // One file per crate, holding only that crate's events
        for crate_name in crate::KNOWN_CRATES {
            let file_appender = rolling::never(&run_folder, format!("{}.log", crate_name));
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            file_guards.push(guard);

            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .json()
                .with_filter(EnvFilter::new(format!(
                    "{}=debug",
                    crate_name.replace('-', "_")
                )))
                .boxed();
            layers.push(file_layer);
        }

        let combined_appender = rolling::never(&run_folder, "simlink.log");
        let (combined_non_blocking, combined_guard) =
            tracing_appender::non_blocking(combined_appender);
        file_guards.push(combined_guard);

        let combined_layer = tracing_subscriber::fmt::layer()
            .with_writer(combined_non_blocking)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .with_filter(build_env_filter(debug_flags, default_level))
            .boxed();
        layers.push(combined_layer);

        Registry::default()
            .with(layers)
            .try_init()
            .context("Failed to initialize logging")?;

        Ok(LoggingGuard {
            _file_guards: file_guards,
            log_dir: run_folder,
        })
    }

    /// Remove run folders older than `retention_days`, then all but the newest `retention_runs`
    ///
    /// Folders whose names do not parse as run timestamps are left alone.
    pub fn cleanup_old_logs(
        base_log_dir: &Path,
        retention_days: u32,
        retention_runs: usize,
    ) -> Result<()> {
        if !base_log_dir.exists() {
            return Ok(());
        }

        let cutoff = Utc::now().naive_utc() - chrono::Duration::days(i64::from(retention_days));

        let mut runs: Vec<(PathBuf, NaiveDateTime)> = Vec::new();
        for entry in std::fs::read_dir(base_log_dir)? {
            let path = entry?.path();
            if !path.is_dir() {
                continue;
            }
            let started = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(|n| n.strip_prefix(RUN_PREFIX))
                .and_then(|ts| NaiveDateTime::parse_from_str(ts, RUN_FORMAT).ok());
            if let Some(started) = started {
                runs.push((path, started));
            }
        }

        // Newest first
        runs.sort_by(|a, b| b.1.cmp(&a.1));

        for (index, (path, started)) in runs.iter().enumerate() {
            if *started < cutoff || index >= retention_runs.max(1) {
                if let Err(e) = std::fs::remove_dir_all(path) {
                    eprintln!(
                        "Warning: Failed to remove old log directory {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn make_run(base: &Path, started: NaiveDateTime) -> PathBuf {
            let path = base.join(format!("{}{}", RUN_PREFIX, started.format(RUN_FORMAT)));
            std::fs::create_dir_all(&path).unwrap();
            path
        }

        #[test]
        fn test_cleanup_by_age_and_count() {
            let dir = tempfile::tempdir().unwrap();
            let now = Utc::now().naive_utc();

            let ancient = make_run(dir.path(), now - chrono::Duration::days(30));
            let recent: Vec<PathBuf> = (1..=4)
                .map(|h| make_run(dir.path(), now - chrono::Duration::hours(h)))
                .collect();
            let unrelated = dir.path().join("keep-me");
            std::fs::create_dir_all(&unrelated).unwrap();

            cleanup_old_logs(dir.path(), 7, 3).unwrap();

            assert!(!ancient.exists());
            assert!(recent[0].exists());
            assert!(recent[1].exists());
            assert!(recent[2].exists());
            assert!(!recent[3].exists());
            assert!(unrelated.exists());
        }

        #[test]
        fn test_cleanup_missing_dir() {
            let dir = tempfile::tempdir().unwrap();
            assert!(cleanup_old_logs(&dir.path().join("absent"), 7, 3).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_flags() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-simlink-session".to_string()]);
        // Only meaningful when RUST_LOG is unset
        if std::env::var("RUST_LOG").is_err() {
            let filter = build_env_filter(&flags, "warn");
            assert!(filter.to_string().contains("simlink_session=debug"));
        }
    }
}
