// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # simlink - simulator session driver
//!
//! Connects a local simulation loop to a remote training service. The service
//! drives episodes turn by turn; simlink owns registration, sequence tracking,
//! transient-fault recovery and unregistration, while your code implements
//! [`Simulator`](prelude::Simulator).
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! simlink = "0.1"  # Default: blocking HTTP client included
//! ```
//!
//! ```rust,no_run
//! use simlink::prelude::*;
//! use std::sync::Arc;
//!
//! struct Counter { value: i64 }
//!
//! impl Simulator for Counter {
//!     fn get_state(&mut self) -> anyhow::Result<StateSnapshot> {
//!         Ok([("value".to_string(), StateValue::Int(self.value))].into())
//!     }
//!     fn get_interface(&self) -> SimulatorInterface {
//!         SimulatorInterface::new("counter")
//!     }
//!     fn halted(&self) -> bool { false }
//!     fn episode_start(&mut self, _config: &Schema) -> anyhow::Result<()> {
//!         self.value = 0;
//!         Ok(())
//!     }
//!     fn episode_step(&mut self, _action: &Schema) -> anyhow::Result<()> {
//!         self.value += 1;
//!         Ok(())
//!     }
//! }
//!
//! let config = load_config(None, None)?;
//! validate_config(&config)?;
//!
//! let client = HttpSessionClient::from_config(&config)?;
//! let mut controller = SessionController::new(
//!     Counter { value: 0 },
//!     Arc::new(client),
//!     SessionConfig::from_config(&config),
//! )?;
//!
//! while controller.step()? {}
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Feature Flags
//!
//! - **`http`** (default): blocking REST client for the simulator session API
//! - **`file-logging`**: timestamped run folders with JSON log files
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  Foundation: simlink-config, simlink-observability      │
//! │  (TOML + env overrides, tracing setup)                  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Session: simlink-session                               │
//! │  (controller, retry, dispatch, normalization, SIGTERM)  │
//! └─────────────────────────────────────────────────────────┘
//!                         ↓
//! ┌─────────────────────────────────────────────────────────┐
//! │  Transport: RemoteSessionClient                         │
//! │  (HttpSessionClient, or your own implementation)        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## License
//!
//! Apache-2.0

pub use simlink_config as config;
pub use simlink_observability as observability;
pub use simlink_session as session;

/// Prelude - commonly used types and traits
pub mod prelude {
    pub use crate::config::{load_config, validate_config, SimlinkConfig};
    pub use crate::session::{
        Event, RemoteError, RemoteSessionClient, RetryPolicy, Schema, SessionConfig,
        SessionController, SessionError, SimulatorInterface, Simulator, StateSnapshot,
        StateValue, StopHandle,
    };

    #[cfg(feature = "http")]
    pub use crate::session::HttpSessionClient;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let config = SimlinkConfig::default();
        let session = SessionConfig::from_config(&config);
        assert_eq!(session.max_retry_attempts, 5);
    }
}
