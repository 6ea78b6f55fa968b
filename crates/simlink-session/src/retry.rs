// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Transient-failure retry policy with exponential backoff

use crate::remote::RemoteError;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Default retry attempts before the session is dropped and re-registered
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default base backoff (first retry waits this long)
pub const DEFAULT_BASE_BACKOFF_MS: u64 = 1_000;

/// Default backoff cap
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

/// Blocking sleep used between retries
pub type Sleeper = Arc<dyn Fn(Duration) + Send + Sync>;

/// How a remote failure is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Network blip: retry with backoff
    Transient,
    /// Service answered with an error status: surface to the caller
    ServiceRejected,
    /// Anything else: surface to the caller
    Fatal,
}

/// Outcome of a transient failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Slept for the given backoff; try the turn again
    Retry(Duration),
    /// Attempts used up; the counter has been reset
    Exhausted,
}

/// Bounded exponential backoff for transient advance failures
///
/// The n-th consecutive retry (counting from zero) waits `base * 2^n`,
/// capped at `max_backoff`. A successful turn resets the counter.
pub struct RetryPolicy {
    /// Base backoff
    base_backoff: Duration,

    /// Maximum backoff
    max_backoff: Duration,

    /// Current attempt number
    current_attempt: u32,

    /// Maximum retry attempts (0 = infinite)
    max_attempts: u32,

    sleeper: Sleeper,
}

impl RetryPolicy {
    /// Create a new retry policy
    ///
    /// # Arguments
    /// * `base_backoff_ms` - Initial backoff duration in milliseconds
    /// * `max_attempts` - Maximum retry attempts (0 = infinite)
    pub fn new(base_backoff_ms: u64, max_attempts: u32) -> Self {
        Self {
            base_backoff: Duration::from_millis(base_backoff_ms),
            max_backoff: Duration::from_millis(DEFAULT_MAX_BACKOFF_MS),
            current_attempt: 0,
            max_attempts,
            sleeper: Arc::new(std::thread::sleep),
        }
    }

    /// Cap every backoff at `max_backoff_ms`
    pub fn with_max_backoff_ms(mut self, max_backoff_ms: u64) -> Self {
        self.max_backoff = Duration::from_millis(max_backoff_ms);
        self
    }

    /// Replace the blocking sleep (tests use this to avoid real waits)
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Decide how a remote failure is treated
    pub fn classify(error: &RemoteError) -> FailureClass {
        match error {
            RemoteError::Connection(_)
            | RemoteError::Timeout(_)
            | RemoteError::MalformedResponse(_) => FailureClass::Transient,
            RemoteError::Http { .. } => FailureClass::ServiceRejected,
            RemoteError::Other(_) => FailureClass::Fatal,
        }
    }

    /// Get next backoff duration with exponential increase
    pub fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }

        let exp = 2u32.saturating_pow(self.current_attempt);
        self.current_attempt += 1;

        Some(self.base_backoff.saturating_mul(exp).min(self.max_backoff))
    }

    /// Handle one transient failure: sleep and retry, or give up
    pub fn on_transient(&mut self, error: &RemoteError) -> RetryDecision {
        match self.next_backoff() {
            Some(backoff) => {
                warn!(
                    "[RETRY] ⚠ Transient failure (attempt {}): {} - retrying in {:?}",
                    self.current_attempt, error, backoff
                );
                (self.sleeper)(backoff);
                RetryDecision::Retry(backoff)
            }
            None => {
                warn!(
                    "[RETRY] ✗ Transient failure persisted after {} attempts: {} - giving up on session",
                    self.current_attempt, error
                );
                self.reset();
                RetryDecision::Exhausted
            }
        }
    }

    /// Reset the policy (after a successful turn)
    pub fn reset(&mut self) {
        if self.current_attempt > 0 {
            info!(
                "[RETRY] ✓ Recovered after {} attempts",
                self.current_attempt
            );
        }
        self.current_attempt = 0;
    }

    /// Get current attempt number
    pub fn attempt_number(&self) -> u32 {
        self.current_attempt
    }

    /// Configured attempt limit (0 = infinite)
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Check if attempts exhausted
    pub fn is_exhausted(&self) -> bool {
        self.max_attempts > 0 && self.current_attempt >= self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS)
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("base_backoff", &self.base_backoff)
            .field("max_backoff", &self.max_backoff)
            .field("current_attempt", &self.current_attempt)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}
