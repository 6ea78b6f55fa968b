// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration for the session controller

use crate::error::{Result, SessionError};
use crate::retry::{
    RetryPolicy, DEFAULT_BASE_BACKOFF_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF_MS,
};
use simlink_config::SimlinkConfig;

/// Session controller configuration builder
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Workspace the simulator registers into
    pub workspace: String,

    /// Context string attached to the interface when the simulator does not set one
    pub simulator_context: Option<String>,

    /// Transient advance retries before the session is dropped (0 = infinite)
    pub max_retry_attempts: u32,

    /// Retry backoff base in milliseconds
    pub retry_backoff_ms: u64,

    /// Retry backoff cap in milliseconds
    pub max_backoff_ms: u64,
}

impl SessionConfig {
    /// Create a new session configuration
    ///
    /// # Example
    /// ```
    /// use simlink_session::SessionConfig;
    ///
    /// let config = SessionConfig::new("my-workspace").with_max_retry_attempts(3);
    /// assert!(config.validate().is_ok());
    /// ```
    pub fn new(workspace: impl Into<String>) -> Self {
        Self {
            workspace: workspace.into(),
            simulator_context: None,
            max_retry_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }

    /// Build from a loaded configuration file
    pub fn from_config(config: &SimlinkConfig) -> Self {
        Self {
            workspace: config.service.workspace.clone(),
            simulator_context: config
                .service
                .simulator_context
                .clone()
                .filter(|ctx| !ctx.is_empty()),
            max_retry_attempts: config.retry.max_attempts,
            retry_backoff_ms: config.retry.base_backoff_ms,
            max_backoff_ms: config.retry.max_backoff_ms,
        }
    }

    /// Set simulator context
    pub fn with_simulator_context(mut self, context: impl Into<String>) -> Self {
        self.simulator_context = Some(context.into());
        self
    }

    /// Set transient retry attempts
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    /// Set retry backoff base in milliseconds
    pub fn with_retry_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.retry_backoff_ms = backoff_ms;
        self
    }

    /// Set retry backoff cap in milliseconds
    pub fn with_max_backoff_ms(mut self, backoff_ms: u64) -> Self {
        self.max_backoff_ms = backoff_ms;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.workspace.trim().is_empty() {
            return Err(SessionError::InvalidConfig(
                "workspace cannot be empty".to_string(),
            ));
        }

        if self.retry_backoff_ms > self.max_backoff_ms {
            return Err(SessionError::InvalidConfig(format!(
                "retry_backoff_ms ({}) exceeds max_backoff_ms ({})",
                self.retry_backoff_ms, self.max_backoff_ms
            )));
        }

        Ok(())
    }

    /// Retry policy described by this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_backoff_ms, self.max_retry_attempts)
            .with_max_backoff_ms(self.max_backoff_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("ws");
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.retry_backoff_ms, 1_000);
        assert_eq!(config.max_backoff_ms, 60_000);
        assert!(config.simulator_context.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        assert!(SessionConfig::new("  ").validate().is_err());

        let config = SessionConfig::new("ws")
            .with_retry_backoff_ms(5_000)
            .with_max_backoff_ms(1_000);
        assert!(matches!(
            config.validate(),
            Err(SessionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_loaded_config() {
        let mut loaded = SimlinkConfig::default();
        loaded.service.workspace = "loaded-ws".to_string();
        loaded.service.simulator_context = Some(String::new());
        loaded.retry.max_attempts = 2;

        let config = SessionConfig::from_config(&loaded);
        assert_eq!(config.workspace, "loaded-ws");
        assert_eq!(config.simulator_context, None);
        assert_eq!(config.max_retry_attempts, 2);
        assert_eq!(config.retry_policy().max_attempts(), 2);
    }
}
