// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Session lifecycle: register, take turns, recover, unregister

use crate::config::SessionConfig;
use crate::dispatcher::{DispatchOutcome, EventDispatcher};
use crate::error::{Result, SessionError};
use crate::event::{SimulatorInterface, SimulatorState};
use crate::normalizer::{NormalizeFn, StateNormalizer};
use crate::remote::{RemoteError, RemoteSessionClient};
use crate::retry::{FailureClass, RetryDecision, RetryPolicy};
use crate::simulator::Simulator;
use crate::termination;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

fn lock_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            mutex.clear_poison();
            poisoned.into_inner()
        }
    }
}

/// Handle for one registered session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Opaque id assigned by the service
    pub session_id: String,

    /// Sequence id echoed back on the next advance
    pub sequence_id: i64,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sequence_id: 1,
        }
    }
}

/// Remote client, workspace and the current session handle.
///
/// Shared between the driving thread and the termination signal thread. Whoever
/// takes the handle out performs the single delete for it.
pub struct SessionLink {
    client: Arc<dyn RemoteSessionClient>,
    workspace: String,
    session: Mutex<Option<Session>>,
}

impl SessionLink {
    pub fn new(client: Arc<dyn RemoteSessionClient>, workspace: impl Into<String>) -> Self {
        Self {
            client,
            workspace: workspace.into(),
            session: Mutex::new(None),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn client(&self) -> &Arc<dyn RemoteSessionClient> {
        &self.client
    }

    pub fn is_registered(&self) -> bool {
        lock_recover(&self.session).is_some()
    }

    /// Snapshot of the current handle
    pub fn session(&self) -> Option<Session> {
        lock_recover(&self.session).clone()
    }

    fn store(&self, session: Session) {
        *lock_recover(&self.session) = Some(session);
    }

    fn set_sequence_id(&self, sequence_id: i64) {
        if let Some(session) = lock_recover(&self.session).as_mut() {
            session.sequence_id = sequence_id;
        }
    }

    /// Take the handle and delete the session
    ///
    /// Returns `None` when there was nothing to release (never registered, or
    /// another caller already took the handle). Delete failures are logged and
    /// returned but the handle stays cleared.
    pub fn release(&self) -> Option<std::result::Result<(), RemoteError>> {
        let session = lock_recover(&self.session).take()?;

        info!(
            "[SESSION] Unregistering session {} from workspace '{}'",
            session.session_id, self.workspace
        );
        let outcome = self.client.delete(&self.workspace, &session.session_id);
        match &outcome {
            Ok(()) => info!("[SESSION] ✓ Session {} unregistered", session.session_id),
            Err(e) => warn!(
                "[SESSION] ⚠ Failed to unregister session {}: {}",
                session.session_id, e
            ),
        }
        Some(outcome)
    }
}

impl Drop for SessionLink {
    fn drop(&mut self) {
        // Best-effort cleanup of a session nobody released
        if self.is_registered() {
            let _ = self.release();
        }
    }
}

/// Cloneable flag asking the controller to stop at the next turn
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Drives one simulator against the remote service, one turn per [`step`](Self::step).
///
/// # Example
/// ```ignore
/// let client = Arc::new(HttpSessionClient::from_config(&loaded)?);
/// let mut controller = SessionController::new(sim, client, SessionConfig::from_config(&loaded))?;
/// while controller.step()? {}
/// ```
pub struct SessionController<S: Simulator> {
    simulator: S,
    link: Arc<SessionLink>,
    config: SessionConfig,
    retry: RetryPolicy,
    normalizer: StateNormalizer,
    dispatcher: EventDispatcher,
    stop: StopHandle,
    /// Reason carried by the last event if it was an Unregister
    end_reason: Option<String>,
}

impl<S: Simulator> SessionController<S> {
    /// Create a controller; nothing is sent until the first `step`
    pub fn new(
        simulator: S,
        client: Arc<dyn RemoteSessionClient>,
        config: SessionConfig,
    ) -> Result<Self> {
        config.validate()?;

        let normalizer = StateNormalizer::new().with_force(simulator.force_complex_state());
        Ok(Self {
            link: Arc::new(SessionLink::new(client, config.workspace.clone())),
            retry: config.retry_policy(),
            normalizer,
            dispatcher: EventDispatcher::new(),
            stop: StopHandle::new(),
            end_reason: None,
            simulator,
            config,
        })
    }

    /// Replace the retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the leaf conversion used for complex state
    pub fn with_normalize_fn(mut self, normalize: NormalizeFn) -> Self {
        self.normalizer = StateNormalizer::new()
            .with_force(self.simulator.force_complex_state())
            .with_normalize_fn(normalize);
        self
    }

    /// Take one turn
    ///
    /// Returns `Ok(true)` while the loop should keep running, `Ok(false)` after
    /// a requested stop, and `Err` for failures the caller must see. The
    /// session has already been released when an error is returned.
    pub fn step(&mut self) -> Result<bool> {
        if self.stop.is_stop_requested() {
            info!("[SESSION] Stop requested - leaving session loop");
            self.unregister();
            return Ok(false);
        }

        match self.link.session() {
            None => {
                self.register()?;
                Ok(true)
            }
            Some(session) => self.take_turn(session),
        }
    }

    fn register(&mut self) -> Result<()> {
        let interface = self.interface();
        info!(
            "[SESSION] Registering simulator '{}' in workspace '{}'",
            interface.name,
            self.link.workspace()
        );

        let registration = self
            .link
            .client()
            .register(self.link.workspace(), &interface)
            .map_err(|e| {
                error!("[SESSION] ✗ Registration failed: {}", e);
                match e {
                    RemoteError::Http { status, reason } => {
                        SessionError::RegistrationRejected { status, reason }
                    }
                    other => SessionError::Registration(other),
                }
            })?;

        info!(
            "[SESSION] ✓ Registered session {}",
            registration.session_id
        );
        self.link.store(Session::new(registration.session_id));
        self.end_reason = None;
        self.retry.reset();

        if self.simulator.attach_to_sigterm() {
            termination::install(&self.link);
        }
        self.simulator.registered();
        Ok(())
    }

    fn interface(&self) -> SimulatorInterface {
        let mut interface = self.simulator.get_interface();
        if interface.simulator_context.is_none() {
            interface.simulator_context = self.config.simulator_context.clone();
        }
        interface
    }

    fn encode_state(&mut self) -> Result<serde_json::Value> {
        let snapshot = self.simulator.get_state()?;
        let snapshot = self.normalizer.prepare(snapshot);
        Ok(serde_json::to_value(&snapshot)?)
    }

    fn take_turn(&mut self, session: Session) -> Result<bool> {
        let body = match self.encode_state() {
            Ok(state) => SimulatorState {
                sequence_id: session.sequence_id,
                state,
                halted: self.simulator.halted(),
            },
            Err(e) => return Err(self.fail(e)),
        };

        debug!(
            "[SESSION] Advancing session {} (sequence {})",
            session.session_id, session.sequence_id
        );
        let response =
            match self
                .link
                .client()
                .advance(self.link.workspace(), &session.session_id, &body)
            {
                Ok(response) => response,
                Err(e) => return self.on_advance_failure(e),
            };

        self.link.set_sequence_id(response.sequence_id);
        self.retry.reset();
        self.end_reason = None;

        debug!(
            "[SESSION] Received {} (sequence {})",
            response.event.kind(),
            response.sequence_id
        );
        match self.dispatcher.dispatch(&mut self.simulator, &response.event) {
            Ok(DispatchOutcome::Continue) => Ok(true),
            Ok(DispatchOutcome::SessionEnded { reason }) => {
                self.end_reason = Some(reason);
                self.unregister();
                Ok(true)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn on_advance_failure(&mut self, error: RemoteError) -> Result<bool> {
        match RetryPolicy::classify(&error) {
            FailureClass::Transient => {
                if self.retry.on_transient(&error) == RetryDecision::Exhausted {
                    self.unregister();
                }
                Ok(true)
            }
            FailureClass::ServiceRejected => {
                let (status, reason) = match error {
                    RemoteError::Http { status, reason } => (status, reason),
                    other => (0, other.to_string()),
                };
                Err(self.fail(SessionError::AdvanceRejected { status, reason }))
            }
            FailureClass::Fatal => Err(self.fail(SessionError::Remote(error))),
        }
    }

    fn fail(&mut self, error: SessionError) -> SessionError {
        error!("[SESSION] ✗ {} - releasing session", error);
        self.unregister();
        error
    }

    /// Release the current session; safe to call at any time
    pub fn unregister(&mut self) {
        let released = self.link.release();
        let reason = self.end_reason.take();
        if let (Some(Ok(())), Some(reason)) = (released, reason) {
            self.simulator.unregistered(&reason);
        }
    }

    pub fn is_registered(&self) -> bool {
        self.link.is_registered()
    }

    pub fn session_id(&self) -> Option<String> {
        self.link.session().map(|s| s.session_id)
    }

    pub fn sequence_id(&self) -> Option<i64> {
        self.link.session().map(|s| s.sequence_id)
    }

    /// Consecutive transient failures on the current turn
    pub fn retry_attempt(&self) -> u32 {
        self.retry.attempt_number()
    }

    /// `None` until the first state has been inspected
    pub fn complex_state(&self) -> Option<bool> {
        self.normalizer.complex_state()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn link(&self) -> &Arc<SessionLink> {
        &self.link
    }

    pub fn simulator(&self) -> &S {
        &self.simulator
    }

    pub fn simulator_mut(&mut self) -> &mut S {
        &mut self.simulator
    }

    /// Release the session and hand back the simulator
    pub fn into_simulator(mut self) -> S {
        self.unregister();
        self.simulator
    }
}
