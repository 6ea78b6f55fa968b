// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{Context, Result};
use clap::Parser;
use simlink_config::{load_config, validate_config, SimlinkConfig};
use simlink_session::{
    HttpSessionClient, Schema, SessionConfig, SessionController, SimulatorInterface, Simulator,
    StateSnapshot,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

/// simlink-minimal - Drives a do-nothing simulator against a live training service
#[derive(Parser, Debug)]
#[command(name = "simlink-minimal", version, author, long_about = None)]
struct Args {
    /// Path to simlink.toml (searched for when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Workspace to register into (overrides SIM_WORKSPACE)
    #[arg(short, long)]
    workspace: Option<String>,

    /// Access key (overrides SIM_ACCESS_KEY)
    #[arg(long)]
    access_key: Option<String>,

    /// Service base URL (overrides SIM_API_HOST)
    #[arg(long)]
    server: Option<String>,

    /// Stop after this many turns (runs until interrupted when omitted)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Enable debug logging for a crate (repeatable), e.g. `--debug simlink-session`
    #[arg(long, value_name = "CRATE")]
    debug: Vec<String>,

    /// Enable verbose logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> HashMap<String, String> {
        [
            ("service.workspace", &self.workspace),
            ("service.access_key", &self.access_key),
            ("service.server", &self.server),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key.to_string(), v)))
        .collect()
    }
}

/// Simulator with an empty state that never halts
struct MinimalSim;

impl Simulator for MinimalSim {
    fn get_state(&mut self) -> anyhow::Result<StateSnapshot> {
        Ok(StateSnapshot::new())
    }

    fn get_interface(&self) -> SimulatorInterface {
        SimulatorInterface::new("minimal")
    }

    fn halted(&self) -> bool {
        false
    }

    fn episode_start(&mut self, _config: &Schema) -> anyhow::Result<()> {
        Ok(())
    }

    fn episode_step(&mut self, _action: &Schema) -> anyhow::Result<()> {
        Ok(())
    }
}

fn debug_flags(args: &Args) -> simlink_observability::CrateDebugFlags {
    let mut flags = simlink_observability::parse_debug_flags();
    for crate_name in &args.debug {
        flags.enable(crate_name);
    }
    flags
}

fn log_level<'a>(args: &Args, config: &'a SimlinkConfig) -> &'a str {
    if args.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    }
}

/// Held until exit so file logs are flushed
#[cfg(feature = "file-logging")]
type LogGuard = Option<simlink_observability::LoggingGuard>;
#[cfg(not(feature = "file-logging"))]
type LogGuard = ();

#[cfg(feature = "file-logging")]
fn init_logging(args: &Args, config: &SimlinkConfig) -> Result<LogGuard> {
    let flags = debug_flags(args);
    let level = log_level(args, config);
    match &config.logging.log_dir {
        Some(log_dir) => {
            let guard = simlink_observability::init_logging(
                &flags,
                level,
                Some(log_dir.clone()),
                Some(config.logging.retention_days),
                Some(config.logging.max_runs),
            )?;
            info!("Logging to {}", guard.log_dir().display());
            Ok(Some(guard))
        }
        None => {
            simlink_observability::init_console_logging(&flags, level)?;
            Ok(None)
        }
    }
}

#[cfg(not(feature = "file-logging"))]
fn init_logging(args: &Args, config: &SimlinkConfig) -> Result<LogGuard> {
    simlink_observability::init_console_logging(&debug_flags(args), log_level(args, config))
}

/// Main entry point
fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref(), Some(&args.overrides()))
        .context("Failed to load configuration")?;
    let _log_guard = init_logging(&args, &config)?;
    validate_config(&config)?;

    info!(
        "Connecting to {} (workspace '{}')",
        config.service.server, config.service.workspace
    );
    let client = HttpSessionClient::from_config(&config)?;
    let mut controller =
        SessionController::new(MinimalSim, Arc::new(client), SessionConfig::from_config(&config))?;

    // Setup signal handler
    let stop = controller.stop_handle();
    ctrlc::set_handler(move || {
        info!("Shutdown signal received...");
        stop.request_stop();
    })?;

    let mut steps: u64 = 0;
    loop {
        match controller.step() {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                error!("✗ Session loop stopped: {}", e);
                return Err(e.into());
            }
        }

        steps += 1;
        if args.max_steps.is_some_and(|max| steps >= max) {
            info!("Reached {} steps", steps);
            controller.unregister();
            break;
        }
    }

    if controller.is_registered() {
        warn!("Session still registered at shutdown");
    }
    info!("✅ simlink-minimal finished after {} steps", steps);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_only_include_given_flags() {
        let args = Args::parse_from(["simlink-minimal", "--workspace", "ws", "--max-steps", "3"]);
        let overrides = args.overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["service.workspace"], "ws");
        assert_eq!(args.max_steps, Some(3));
    }

    #[test]
    fn test_minimal_sim_state_is_empty() {
        let mut sim = MinimalSim;
        assert!(sim.get_state().unwrap().is_empty());
        assert!(!sim.halted());
        assert_eq!(sim.get_interface().name, "minimal");
    }
}
