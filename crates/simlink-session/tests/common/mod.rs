// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common test utilities: a scripted in-memory service and a recording simulator

#![allow(dead_code)]

use serde_json::json;
use simlink_session::{
    AdvanceResponse, Event, RemoteError, RemoteSessionClient, RetryPolicy, Schema,
    SessionRegistration, SimulatorInterface, SimulatorState, Simulator, StateSnapshot, StateValue,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// In-memory stand-in for the training service
///
/// Advance calls are counted from 1 across sessions. The first call answers
/// EpisodeStart, later calls EpisodeStep. Response sequence ids are derived
/// from the sent id but never follow it by one, so a client that counts on its
/// own instead of echoing the service is caught.
#[derive(Default)]
pub struct ScriptedClient {
    pub register_error: Option<RemoteError>,
    /// Advance call number -> failure returned instead of an event
    pub advance_failures: HashMap<usize, RemoteError>,
    /// Every advance fails with this error
    pub always_fail: Option<RemoteError>,
    /// Every n-th advance call answers Unregister
    pub unregister_every: Option<usize>,
    /// Answer Idle instead of EpisodeStep
    pub idle_events: bool,
    /// Callback time carried by Idle events
    pub idle_callback_time: Option<f64>,
    /// Every delete fails with this error
    pub delete_error: Option<RemoteError>,

    pub registrations: AtomicUsize,
    pub advances: AtomicUsize,
    pub deletes: AtomicUsize,
    /// Sequence id sent on every advance call, failed ones included
    pub sent_sequence_ids: Mutex<Vec<i64>>,
    /// Sequence id returned on every successful advance
    pub returned_sequence_ids: Mutex<Vec<i64>>,
    pub interfaces: Mutex<Vec<SimulatorInterface>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrations(&self) -> usize {
        self.registrations.load(Ordering::SeqCst)
    }

    pub fn advances(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn sent_sequence_ids(&self) -> Vec<i64> {
        self.sent_sequence_ids.lock().unwrap().clone()
    }

    pub fn returned_sequence_ids(&self) -> Vec<i64> {
        self.returned_sequence_ids.lock().unwrap().clone()
    }
}

impl RemoteSessionClient for ScriptedClient {
    fn register(
        &self,
        _workspace: &str,
        interface: &SimulatorInterface,
    ) -> Result<SessionRegistration, RemoteError> {
        let n = self.registrations.fetch_add(1, Ordering::SeqCst) + 1;
        self.interfaces.lock().unwrap().push(interface.clone());
        match &self.register_error {
            Some(e) => Err(e.clone()),
            None => Ok(SessionRegistration::new(format!("session-{}", n))),
        }
    }

    fn advance(
        &self,
        _workspace: &str,
        _session_id: &str,
        state: &SimulatorState,
    ) -> Result<AdvanceResponse, RemoteError> {
        let call = self.advances.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent_sequence_ids.lock().unwrap().push(state.sequence_id);

        if let Some(e) = &self.always_fail {
            return Err(e.clone());
        }
        if let Some(e) = self.advance_failures.get(&call) {
            return Err(e.clone());
        }

        let event = if call == 1 {
            Event::EpisodeStart {
                config: schema(json!({"length": 10})),
            }
        } else if self.unregister_every.is_some_and(|n| call % n == 0) {
            Event::Unregister {
                reason: "Finished".to_string(),
            }
        } else if self.idle_events {
            Event::Idle {
                callback_time: self.idle_callback_time,
            }
        } else {
            Event::EpisodeStep {
                action: schema(json!({"command": 1.0})),
            }
        };

        let next = next_sequence_id(state.sequence_id);
        self.returned_sequence_ids.lock().unwrap().push(next);
        Ok(AdvanceResponse::new(next, event))
    }

    fn delete(&self, _workspace: &str, _session_id: &str) -> Result<(), RemoteError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        match &self.delete_error {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

/// Sequence id the scripted service answers for `sent`
pub fn next_sequence_id(sent: i64) -> i64 {
    (sent * 7 + 3) % 10_007
}

pub fn schema(value: serde_json::Value) -> Schema {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

/// Simulator recording every callback it receives
#[derive(Default)]
pub struct RecordingSim {
    pub value: i64,
    pub attach_to_sigterm: bool,
    pub force_complex: bool,
    pub complex_fields: bool,
    pub starts: usize,
    pub steps: usize,
    pub idles: Vec<f64>,
    pub registered: usize,
    pub unregistered: Vec<String>,
}

impl RecordingSim {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> usize {
        self.starts + self.steps + self.idles.len()
    }
}

impl Simulator for RecordingSim {
    fn get_state(&mut self) -> anyhow::Result<StateSnapshot> {
        let mut state = StateSnapshot::new();
        state.insert("value".to_string(), StateValue::Int(self.value));
        if self.complex_fields {
            state.insert("velocity".to_string(), StateValue::from(0.5f32));
        }
        Ok(state)
    }

    fn get_interface(&self) -> SimulatorInterface {
        SimulatorInterface::new("recording").with_timeout(60.0)
    }

    fn halted(&self) -> bool {
        false
    }

    fn episode_start(&mut self, _config: &Schema) -> anyhow::Result<()> {
        self.starts += 1;
        self.value = 0;
        Ok(())
    }

    fn episode_step(&mut self, action: &Schema) -> anyhow::Result<()> {
        self.steps += 1;
        self.value += action
            .get("command")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0) as i64;
        Ok(())
    }

    fn registered(&mut self) {
        self.registered += 1;
    }

    fn unregistered(&mut self, reason: &str) {
        self.unregistered.push(reason.to_string());
    }

    fn idle(&mut self, callback_time: f64) -> anyhow::Result<()> {
        self.idles.push(callback_time);
        Ok(())
    }

    fn force_complex_state(&self) -> bool {
        self.force_complex
    }

    fn attach_to_sigterm(&self) -> bool {
        self.attach_to_sigterm
    }
}

/// Retry policy with the production defaults that records sleeps instead of blocking
pub fn recording_retry_policy() -> (RetryPolicy, Arc<Mutex<Vec<Duration>>>) {
    let slept = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&slept);
    let policy =
        RetryPolicy::default().with_sleeper(Arc::new(move |d| sink.lock().unwrap().push(d)));
    (policy, slept)
}
