// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session wire types and the events the service sends back each turn

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

/// Free-form JSON object used for episode configs and actions
pub type Schema = serde_json::Map<String, serde_json::Value>;

/// Interface description sent when registering a simulator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorInterface {
    pub name: String,

    /// Seconds the service waits for a turn before dropping the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator_context: Option<String>,

    /// Optional machine-readable description of states, actions and config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<serde_json::Value>,
}

impl SimulatorInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout_secs: f64) -> Self {
        self.timeout = Some(timeout_secs);
        self
    }

    pub fn with_simulator_context(mut self, context: impl Into<String>) -> Self {
        self.simulator_context = Some(context.into());
        self
    }

    pub fn with_description(mut self, description: serde_json::Value) -> Self {
        self.description = Some(description);
        self
    }
}

/// Service response to a successful registration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRegistration {
    pub session_id: String,

    #[serde(default)]
    pub session_status: Option<String>,

    #[serde(default)]
    pub registration_time: Option<String>,
}

impl SessionRegistration {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            session_status: None,
            registration_time: None,
        }
    }
}

/// Body of an advance request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatorState {
    pub sequence_id: i64,
    pub state: serde_json::Value,
    pub halted: bool,
}

/// Event delivered in response to an advance request
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    EpisodeStart { config: Schema },
    EpisodeStep { action: Schema },
    EpisodeFinish { reason: String },
    /// `callback_time` is absent when the service omits the field
    Idle { callback_time: Option<f64> },
    Unregister { reason: String },
    /// Tag this client does not know, or a known tag without its payload
    Unrecognized { kind: String },
}

impl Event {
    /// Wire tag for this event
    pub fn kind(&self) -> &str {
        match self {
            Event::EpisodeStart { .. } => "EpisodeStart",
            Event::EpisodeStep { .. } => "EpisodeStep",
            Event::EpisodeFinish { .. } => "EpisodeFinish",
            Event::Idle { .. } => "Idle",
            Event::Unregister { .. } => "Unregister",
            Event::Unrecognized { kind } => kind,
        }
    }
}

/// One event plus the sequence id the next advance must echo
#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceResponse {
    pub sequence_id: i64,
    pub event: Event,
}

impl AdvanceResponse {
    pub fn new(sequence_id: i64, event: Event) -> Self {
        Self { sequence_id, event }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(deserialize_with = "deserialize_sequence_id")]
    sequence_id: i64,
    #[serde(default)]
    episode_start: Option<RawEpisodeStart>,
    #[serde(default)]
    episode_step: Option<RawEpisodeStep>,
    #[serde(default)]
    episode_finish: Option<RawReason>,
    #[serde(default)]
    idle: Option<RawIdle>,
    #[serde(default)]
    unregister: Option<RawReason>,
}

#[derive(Deserialize)]
struct RawEpisodeStart {
    #[serde(default)]
    config: Schema,
}

#[derive(Deserialize)]
struct RawEpisodeStep {
    #[serde(default)]
    action: Schema,
}

#[derive(Deserialize)]
struct RawReason {
    #[serde(default)]
    reason: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIdle {
    #[serde(default)]
    callback_time: Option<f64>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SequenceRepr {
    Number(i64),
    Text(String),
}

// The service has been seen sending sequence ids both as numbers and as strings
fn deserialize_sequence_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match SequenceRepr::deserialize(deserializer)? {
        SequenceRepr::Number(n) => Ok(n),
        SequenceRepr::Text(s) => s
            .trim()
            .parse()
            .map_err(|e| D::Error::custom(format!("invalid sequenceId {:?}: {}", s, e))),
    }
}

impl From<RawEvent> for AdvanceResponse {
    fn from(raw: RawEvent) -> Self {
        let event = match raw.kind.as_str() {
            "EpisodeStart" => raw
                .episode_start
                .map(|p| Event::EpisodeStart { config: p.config }),
            "EpisodeStep" => raw
                .episode_step
                .map(|p| Event::EpisodeStep { action: p.action }),
            "EpisodeFinish" => raw
                .episode_finish
                .map(|p| Event::EpisodeFinish { reason: p.reason }),
            "Idle" => Some(Event::Idle {
                callback_time: raw.idle.and_then(|p| p.callback_time),
            }),
            "Unregister" => raw
                .unregister
                .map(|p| Event::Unregister { reason: p.reason }),
            _ => None,
        }
        .unwrap_or(Event::Unrecognized { kind: raw.kind });

        AdvanceResponse {
            sequence_id: raw.sequence_id,
            event,
        }
    }
}

impl<'de> Deserialize<'de> for AdvanceResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawEvent::deserialize(deserializer).map(AdvanceResponse::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> AdvanceResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_string_sequence_id() {
        let response = parse(json!({
            "type": "EpisodeStart",
            "sessionId": "0123",
            "sequenceId": "7",
            "episodeStart": {"config": {"length": 3}},
        }));
        assert_eq!(response.sequence_id, 7);
        match response.event {
            Event::EpisodeStart { config } => assert_eq!(config["length"], json!(3)),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_idle_without_callback_time() {
        let response = parse(json!({"type": "Idle", "sequenceId": 2, "idle": {}}));
        assert_eq!(response.event, Event::Idle { callback_time: None });

        let response = parse(json!({"type": "Idle", "sequenceId": 2, "idle": {"callbackTime": 0.5}}));
        assert_eq!(
            response.event,
            Event::Idle {
                callback_time: Some(0.5)
            }
        );
    }

    #[test]
    fn test_unknown_tag_and_missing_payload() {
        let response = parse(json!({"type": "PlaybackStart", "sequenceId": 3}));
        assert_eq!(
            response.event,
            Event::Unrecognized {
                kind: "PlaybackStart".to_string()
            }
        );

        let response = parse(json!({"type": "EpisodeStep", "sequenceId": 3}));
        assert_eq!(response.event.kind(), "EpisodeStep");
        assert!(matches!(response.event, Event::Unrecognized { .. }));
    }

    #[test]
    fn test_unregister_reason() {
        let response = parse(json!({
            "type": "Unregister",
            "sequenceId": "1",
            "unregister": {"reason": "Finished", "details": "Some details"},
        }));
        assert_eq!(
            response.event,
            Event::Unregister {
                reason: "Finished".to_string()
            }
        );
    }

    #[test]
    fn test_bad_sequence_id_is_rejected() {
        let result: Result<AdvanceResponse, _> =
            serde_json::from_value(json!({"type": "Idle", "sequenceId": "abc"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_interface_serialization_skips_unset_fields() {
        let interface = SimulatorInterface::new("minimal").with_simulator_context("ctx");
        assert_eq!(
            serde_json::to_value(&interface).unwrap(),
            json!({"name": "minimal", "simulatorContext": "ctx"})
        );
    }
}
