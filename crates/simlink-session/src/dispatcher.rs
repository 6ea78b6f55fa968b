// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Routes service events to simulator callbacks

use crate::error::Result;
use crate::event::Event;
use crate::simulator::Simulator;
use tracing::{debug, info};

/// What the controller should do after an event was dispatched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Keep taking turns on the current session
    Continue,
    /// The service ended the session; release it and register again next turn
    SessionEnded { reason: String },
}

/// Stateless event router
#[derive(Debug, Default, Clone, Copy)]
pub struct EventDispatcher;

impl EventDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Invoke the callback matching `event`
    ///
    /// Callback failures propagate as [`SessionError::Simulator`]. Unknown
    /// event kinds are ignored so newer services stay compatible.
    ///
    /// [`SessionError::Simulator`]: crate::SessionError::Simulator
    pub fn dispatch<S: Simulator + ?Sized>(
        &self,
        simulator: &mut S,
        event: &Event,
    ) -> Result<DispatchOutcome> {
        match event {
            Event::EpisodeStart { config } => simulator.episode_start(config)?,
            Event::EpisodeStep { action } => simulator.episode_step(action)?,
            Event::EpisodeFinish { reason } => simulator.episode_finish(reason)?,
            Event::Idle { callback_time } => simulator.idle(callback_time.unwrap_or(0.0))?,
            Event::Unregister { reason } => {
                info!("[DISPATCH] Service ended the session: {}", reason);
                return Ok(DispatchOutcome::SessionEnded {
                    reason: reason.clone(),
                });
            }
            Event::Unrecognized { kind } => {
                debug!("[DISPATCH] Ignoring unrecognized event: {}", kind);
            }
        }
        Ok(DispatchOutcome::Continue)
    }
}
