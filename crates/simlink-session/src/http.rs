// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Blocking HTTP implementation of [`RemoteSessionClient`]

use crate::error::{Result, SessionError};
use crate::event::{AdvanceResponse, SessionRegistration, SimulatorInterface, SimulatorState};
use crate::remote::{canonical_reason, RemoteError, RemoteSessionClient};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use simlink_config::SimlinkConfig;
use std::time::Duration;
use tracing::debug;

const USER_AGENT: &str = concat!("simlink/", env!("CARGO_PKG_VERSION"));

/// Talks to the simulator session REST API
#[derive(Debug, Clone)]
pub struct HttpSessionClient {
    client: Client,
    server: String,
    access_key: String,
}

impl HttpSessionClient {
    /// Create a client for `server` (scheme and host, no trailing path)
    pub fn new(
        server: impl Into<String>,
        access_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| SessionError::InvalidConfig(format!("HTTP client init failed: {e}")))?;

        Ok(Self {
            client,
            server: server.into().trim_end_matches('/').to_string(),
            access_key: access_key.into(),
        })
    }

    /// Build from a loaded configuration file
    pub fn from_config(config: &SimlinkConfig) -> Result<Self> {
        Self::new(
            config.service.server.clone(),
            config.service.access_key.clone(),
            Duration::from_secs(config.service.request_timeout_secs),
        )
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn sessions_url(&self, workspace: &str) -> String {
        format!(
            "{}/v2/workspaces/{}/simulatorSessions",
            self.server, workspace
        )
    }

    fn session_url(&self, workspace: &str, session_id: &str) -> String {
        format!("{}/{}", self.sessions_url(workspace), session_id)
    }

    fn send(&self, request: RequestBuilder) -> std::result::Result<Response, RemoteError> {
        let response = request
            .header(AUTHORIZATION, &self.access_key)
            .send()
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let code = status.as_u16();
        let reason = status
            .canonical_reason()
            .unwrap_or_else(|| canonical_reason(code));
        debug!("[HTTP] {} returned {} {}", response.url(), code, reason);
        Err(RemoteError::Http {
            status: code,
            reason: reason.to_string(),
        })
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> std::result::Result<T, RemoteError> {
        self.send(request)?.json::<T>().map_err(map_transport_error)
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteError {
    if error.is_builder() {
        // Bad URL or header value: retrying cannot help
        RemoteError::Other(error.to_string())
    } else if error.is_timeout() {
        RemoteError::Timeout(error.to_string())
    } else if error.is_connect() {
        RemoteError::Connection(error.to_string())
    } else if error.is_body() || error.is_decode() {
        RemoteError::MalformedResponse(error.to_string())
    } else {
        RemoteError::Other(error.to_string())
    }
}

impl RemoteSessionClient for HttpSessionClient {
    fn register(
        &self,
        workspace: &str,
        interface: &SimulatorInterface,
    ) -> std::result::Result<SessionRegistration, RemoteError> {
        let url = self.sessions_url(workspace);
        debug!("[HTTP] POST {}", url);
        self.send_json(self.client.post(url).json(interface))
    }

    fn advance(
        &self,
        workspace: &str,
        session_id: &str,
        state: &SimulatorState,
    ) -> std::result::Result<AdvanceResponse, RemoteError> {
        let url = format!("{}/advance", self.session_url(workspace, session_id));
        debug!("[HTTP] POST {} (sequence {})", url, state.sequence_id);
        self.send_json(self.client.post(url).json(state))
    }

    fn delete(&self, workspace: &str, session_id: &str) -> std::result::Result<(), RemoteError> {
        let url = self.session_url(workspace, session_id);
        debug!("[HTTP] DELETE {}", url);
        self.send(self.client.delete(url)).map(|_| ())
    }
}
