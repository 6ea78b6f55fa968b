// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Contract for the remote training service client
//!
//! The controller only ever talks to the service through [`RemoteSessionClient`].
//! The `http` feature provides a blocking HTTP implementation; tests and
//! embedders can supply their own.

use crate::event::{AdvanceResponse, SessionRegistration, SimulatorInterface, SimulatorState};

/// Failure raised by a [`RemoteSessionClient`] call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RemoteError {
    /// Could not reach the service
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Request timed out
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Response was truncated, aborted, or could not be decoded
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Service answered with an error status
    #[error("HTTP {status} {reason}")]
    Http { status: u16, reason: String },

    /// Anything else
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    /// Network-request-level failures that may clear up on their own
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteError::Connection(_) | RemoteError::Timeout(_) | RemoteError::MalformedResponse(_)
        )
    }

    /// HTTP status, if the service rejected the request
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Build an HTTP error from a status code using its canonical reason phrase
    pub fn http(status: u16) -> Self {
        RemoteError::Http {
            status,
            reason: canonical_reason(status).to_string(),
        }
    }
}

/// Canonical reason phrase for the statuses the service is known to return
pub fn canonical_reason(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        409 => "Conflict",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "Unknown",
    }
}

/// Register / advance / delete calls against the remote training service.
///
/// Implementations must be shareable with the termination signal thread,
/// which may call [`delete`](Self::delete) while a turn is in flight.
pub trait RemoteSessionClient: Send + Sync {
    /// Create a new simulator session in `workspace`
    fn register(
        &self,
        workspace: &str,
        interface: &SimulatorInterface,
    ) -> Result<SessionRegistration, RemoteError>;

    /// Send the current state and receive the next event
    fn advance(
        &self,
        workspace: &str,
        session_id: &str,
        state: &SimulatorState,
    ) -> Result<AdvanceResponse, RemoteError>;

    /// End the session. Callers treat failure as advisory.
    fn delete(&self, workspace: &str, session_id: &str) -> Result<(), RemoteError>;
}
