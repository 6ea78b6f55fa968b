// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Simulator session driver
//!
//! Keeps a local simulation loop in lock-step with a remote training service.
//! The caller implements [`Simulator`]; the driver owns registration,
//! turn-taking, transient-fault recovery and teardown.
//!
//! # Features
//! - Registration with the service on the first turn and after every session end
//! - Sequence tracking across turns
//! - Bounded exponential backoff for transient network failures
//! - Complex state (fixed-width numerics, n-dimensional arrays) normalization
//! - Best-effort unregistration on errors, drop, and SIGTERM
//! - Blocking HTTP client (feature `http`)
//!
//! # Quick Start
//!
//! ```ignore
//! use simlink_session::{HttpSessionClient, SessionConfig, SessionController};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let client = HttpSessionClient::new("https://api.example.com", "access-key", Duration::from_secs(60))?;
//! let config = SessionConfig::new("my-workspace");
//! let mut controller = SessionController::new(MySim::default(), Arc::new(client), config)?;
//!
//! while controller.step()? {}
//! ```
//!
//! # Error Handling
//!
//! `step` returns `Result<bool, SessionError>`:
//! - **Absorbed**: connection failures, timeouts, truncated responses (retried with backoff)
//! - **Surfaced**: registration rejections, service error statuses, callback failures
//!
//! The session is released before any error is returned.
//!
//! # Thread Safety
//!
//! The controller is driven from one thread. The session handle lives in an
//! `Arc<SessionLink>` shared with the SIGTERM listener thread; whichever side
//! takes the handle first performs the single delete.

pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod normalizer;
pub mod remote;
pub mod retry;
pub mod simulator;
pub mod state;
pub mod termination;

#[cfg(feature = "http")]
pub mod http;

// Re-export main types for convenience
pub use config::SessionConfig;
pub use controller::{Session, SessionController, SessionLink, StopHandle};
pub use dispatcher::{DispatchOutcome, EventDispatcher};
pub use error::{Result, SessionError};
pub use event::{
    AdvanceResponse, Event, Schema, SessionRegistration, SimulatorInterface, SimulatorState,
};
pub use normalizer::{default_normalize, NormalizeFn, StateNormalizer};
pub use remote::{RemoteError, RemoteSessionClient};
pub use retry::{FailureClass, RetryDecision, RetryPolicy};
pub use simulator::Simulator;
pub use state::{NumericScalar, StateSnapshot, StateValue};
pub use termination::TerminationSignalHandler;

#[cfg(feature = "http")]
pub use http::HttpSessionClient;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdk_imports() {
        let config = SessionConfig::new("test");
        assert!(config.validate().is_ok());
        let _policy: RetryPolicy = config.retry_policy();
    }
}
