// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Callbacks a simulator implements to be driven by a [`SessionController`]
//!
//! [`SessionController`]: crate::SessionController

use crate::event::{Schema, SimulatorInterface};
use crate::state::StateSnapshot;
use std::time::Duration;
use tracing::{info, warn};

/// A local simulation driven turn by turn by the remote training service.
///
/// Required methods produce state and consume actions. The optional ones have
/// defaults that log or do nothing; `idle` blocks for the requested time.
///
/// # Example
/// ```ignore
/// struct Cartpole { x: f64 }
///
/// impl Simulator for Cartpole {
///     fn get_state(&mut self) -> anyhow::Result<StateSnapshot> {
///         Ok([("x".to_string(), StateValue::Float(self.x))].into())
///     }
///     fn get_interface(&self) -> SimulatorInterface {
///         SimulatorInterface::new("cartpole")
///     }
///     fn halted(&self) -> bool { self.x.abs() > 2.4 }
///     fn episode_start(&mut self, _config: &Schema) -> anyhow::Result<()> {
///         self.x = 0.0;
///         Ok(())
///     }
///     fn episode_step(&mut self, action: &Schema) -> anyhow::Result<()> {
///         self.x += action["command"].as_f64().unwrap_or(0.0);
///         Ok(())
///     }
/// }
/// ```
pub trait Simulator: Send {
    /// Current simulator state, sent to the service every turn
    fn get_state(&mut self) -> anyhow::Result<StateSnapshot>;

    /// Interface description used during registration
    fn get_interface(&self) -> SimulatorInterface;

    /// Whether the episode is halted and no further action will produce a state
    fn halted(&self) -> bool;

    /// Called at the start of each episode
    fn episode_start(&mut self, config: &Schema) -> anyhow::Result<()>;

    /// Called for each step of the episode
    fn episode_step(&mut self, action: &Schema) -> anyhow::Result<()>;

    /// Called at the end of an episode
    fn episode_finish(&mut self, _reason: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called after the simulator is successfully registered
    fn registered(&mut self) {
        info!("[SIM] Registered.");
    }

    /// Called when the service ended the session and it has been released
    fn unregistered(&mut self, reason: &str) {
        info!("[SIM] Unregistered: {}", reason);
    }

    /// Called when the service has no work; blocks for `callback_time` seconds
    ///
    /// Zero, negative and NaN times return at once. A time too large for a
    /// `Duration` is an error, which releases the session.
    fn idle(&mut self, callback_time: f64) -> anyhow::Result<()> {
        info!("[SIM] Idling...");
        if callback_time.is_nan() || callback_time <= 0.0 {
            return Ok(());
        }
        let wait = Duration::try_from_secs_f64(callback_time).map_err(|e| {
            warn!("[SIM] ⚠ Idle callback time {} out of range: {}", callback_time, e);
            anyhow::anyhow!("idle callback time {}s out of range: {}", callback_time, e)
        })?;
        std::thread::sleep(wait);
        Ok(())
    }

    /// Normalize every snapshot even when the first one looked primitive
    fn force_complex_state(&self) -> bool {
        false
    }

    /// Release the session on SIGTERM before the process exits
    fn attach_to_sigterm(&self) -> bool {
        true
    }
}
