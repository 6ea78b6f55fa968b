// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Process-wide SIGTERM handling
//!
//! A single listener thread is spawned the first time a controller registers.
//! It releases whichever session link was installed most recently, then exits
//! the process with `128 + signal`.

use crate::controller::SessionLink;
use std::sync::{Arc, Mutex, OnceLock, Weak};
use tracing::{info, warn};

static HANDLER: OnceLock<TerminationSignalHandler> = OnceLock::new();

/// Holds the session link to release when a termination signal arrives
#[derive(Default)]
pub struct TerminationSignalHandler {
    target: Mutex<Weak<SessionLink>>,
}

impl TerminationSignalHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the handler at `link`, replacing any previous target
    pub fn retarget(&self, link: &Arc<SessionLink>) {
        match self.target.lock() {
            Ok(mut target) => *target = Arc::downgrade(link),
            Err(poisoned) => *poisoned.into_inner() = Arc::downgrade(link),
        }
    }

    /// Release the targeted session without exiting
    ///
    /// Returns true if a session was held and a delete was attempted.
    pub fn handle_signal(&self, signal: i32) -> bool {
        info!("[SIGNAL] Received signal {} - unregistering session", signal);
        let link = match self.target.lock() {
            Ok(target) => target.upgrade(),
            Err(poisoned) => poisoned.into_inner().upgrade(),
        };
        match link {
            Some(link) => link.release().is_some(),
            None => false,
        }
    }
}

/// Install (once) the SIGTERM listener and target `link`
pub fn install(link: &Arc<SessionLink>) {
    let mut spawned = false;
    let handler = HANDLER.get_or_init(|| {
        spawned = true;
        TerminationSignalHandler::new()
    });
    handler.retarget(link);

    if spawned {
        spawn_listener(handler);
    }
}

/// Run the termination step for `signal` against the installed handler
///
/// Does nothing if no controller has installed a handler yet.
pub fn handle_signal(signal: i32) -> bool {
    HANDLER
        .get()
        .map(|handler| handler.handle_signal(signal))
        .unwrap_or(false)
}

#[cfg(unix)]
fn spawn_listener(handler: &'static TerminationSignalHandler) {
    use signal_hook::consts::SIGTERM;
    use signal_hook::iterator::Signals;

    let mut signals = match Signals::new([SIGTERM]) {
        Ok(signals) => signals,
        Err(e) => {
            warn!("[SIGNAL] ⚠ Could not install SIGTERM handler: {}", e);
            return;
        }
    };

    let spawned = std::thread::Builder::new()
        .name("simlink-sigterm".to_string())
        .spawn(move || {
            if let Some(signal) = signals.forever().next() {
                handler.handle_signal(signal);
                std::process::exit(128 + signal);
            }
        });
    match spawned {
        Ok(_) => info!("[SIGNAL] ✓ SIGTERM handler installed"),
        Err(e) => warn!("[SIGNAL] ⚠ Could not start SIGTERM listener: {}", e),
    }
}

#[cfg(not(unix))]
fn spawn_listener(_handler: &'static TerminationSignalHandler) {
    tracing::debug!("[SIGNAL] SIGTERM handling is not supported on this platform");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AdvanceResponse, SessionRegistration, SimulatorInterface, SimulatorState};
    use crate::remote::{RemoteError, RemoteSessionClient};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct DeleteCounter(AtomicUsize);

    impl RemoteSessionClient for DeleteCounter {
        fn register(
            &self,
            _workspace: &str,
            _interface: &SimulatorInterface,
        ) -> Result<SessionRegistration, RemoteError> {
            Ok(SessionRegistration::new("s"))
        }

        fn advance(
            &self,
            _workspace: &str,
            _session_id: &str,
            _state: &SimulatorState,
        ) -> Result<AdvanceResponse, RemoteError> {
            Err(RemoteError::Other("unused".into()))
        }

        fn delete(&self, _workspace: &str, _session_id: &str) -> Result<(), RemoteError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_handler_without_target_is_noop() {
        let handler = TerminationSignalHandler::new();
        assert!(!handler.handle_signal(15));
    }

    #[test]
    fn test_handler_follows_latest_target() {
        let client = Arc::new(DeleteCounter::default());
        let handler = TerminationSignalHandler::new();

        let first = Arc::new(SessionLink::new(client.clone(), "ws"));
        let second = Arc::new(SessionLink::new(client.clone(), "ws"));
        handler.retarget(&first);
        handler.retarget(&second);

        // Nothing registered yet
        assert!(!handler.handle_signal(15));
        assert_eq!(client.0.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dropped_link_is_not_kept_alive() {
        let client = Arc::new(DeleteCounter::default());
        let handler = TerminationSignalHandler::new();
        {
            let link = Arc::new(SessionLink::new(client, "ws"));
            handler.retarget(&link);
        }
        assert!(!handler.handle_signal(15));
    }
}
