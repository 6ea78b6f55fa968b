// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Error types for the simulator session driver

use crate::remote::RemoteError;

/// Result type alias using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors that cross the session driver boundary.
///
/// Transient network failures never appear here: they are absorbed by the
/// retry policy. Unregistration failures are only logged.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The service answered the registration request with an HTTP error status
    #[error("Registration rejected ({status} {reason})")]
    RegistrationRejected { status: u16, reason: String },

    /// Registration failed before the service produced a status
    #[error("Registration failed: {0}")]
    Registration(#[source] RemoteError),

    /// The service answered an advance request with an HTTP error status
    #[error("Advance rejected ({status} {reason})")]
    AdvanceRejected { status: u16, reason: String },

    /// Unexpected failure from the remote client during a turn
    #[error("Remote session error: {0}")]
    Remote(#[source] RemoteError),

    /// State could not be encoded for transmission
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A simulator callback failed
    #[error("Simulator callback failed: {0}")]
    Simulator(#[from] anyhow::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Generic session error
    #[error("Session error: {0}")]
    Other(String),
}

impl SessionError {
    /// Check if error is retryable
    ///
    /// Only remote failures classified as transient qualify. The controller
    /// retries those before they are ever wrapped in a `SessionError`, so a
    /// retryable error reaching the caller means registration hit a network blip.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::Registration(e) | SessionError::Remote(e) => e.is_transient(),
            _ => false,
        }
    }

    /// HTTP status carried by this error, if the service rejected a request
    pub fn status(&self) -> Option<u16> {
        match self {
            SessionError::RegistrationRejected { status, .. }
            | SessionError::AdvanceRejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Reason phrase carried by this error, if the service rejected a request
    pub fn reason(&self) -> Option<&str> {
        match self {
            SessionError::RegistrationRejected { reason, .. }
            | SessionError::AdvanceRejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}
