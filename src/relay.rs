//! Lifecycle of the long-range teletype (Hoppie ACARS) relay.
//!
//! The relay itself is an external collaborator; its transport protocol is not
//! part of this crate. [`RelayLifecycle`] owns the collaborator and guarantees
//! the order of calls into it: `initialize` at most once, then alternating
//! `start`/`stop`, never `start` twice in a row and never before `initialize`.

use crate::core::Notifier;
use crate::host::DebugSink;
use std::sync::Arc;
use tracing::debug;

/// Everything the relay needs from the engine.
#[derive(Clone)]
pub struct RelayContext {
    pub notifier: Arc<dyn Notifier>,
    pub debug: Arc<dyn DebugSink>,
    pub logon_code: String,
}

/// A teletype relay collaborator.
pub trait TeletypeRelay: Send {
    fn initialize(&mut self, context: RelayContext);
    /// Starts relaying for the freshly connected callsign.
    fn start(&mut self, callsign: &str);
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Uninitialized,
    Idle,
    Running,
}

/// Enforces the call-order contract around a [`TeletypeRelay`].
pub struct RelayLifecycle {
    relay: Box<dyn TeletypeRelay>,
    state: RelayState,
}

impl RelayLifecycle {
    pub fn new(relay: Box<dyn TeletypeRelay>) -> Self {
        Self {
            relay,
            state: RelayState::Uninitialized,
        }
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Initializes the collaborator. Later calls are ignored.
    pub fn initialize(&mut self, context: RelayContext) {
        if self.state != RelayState::Uninitialized {
            debug!("Teletype relay already initialized, ignoring.");
            return;
        }
        self.relay.initialize(context);
        self.state = RelayState::Idle;
    }

    pub fn start(&mut self, callsign: &str) {
        match self.state {
            RelayState::Idle => {
                self.relay.start(callsign);
                self.state = RelayState::Running;
            }
            RelayState::Running => debug!("Teletype relay already running, ignoring start."),
            RelayState::Uninitialized => debug!("Teletype relay not initialized, ignoring start."),
        }
    }

    pub fn stop(&mut self) {
        if self.state == RelayState::Running {
            self.relay.stop();
            self.state = RelayState::Idle;
        } else {
            debug!(state = ?self.state, "Teletype relay not running, ignoring stop.");
        }
    }
}

/// A collaborator that only reports its lifecycle on the host debug channel.
///
/// Used when no real teletype client is linked into the host.
#[derive(Default)]
pub struct DebugRelay {
    context: Option<RelayContext>,
}

impl DebugRelay {
    pub fn new() -> Self {
        Self::default()
    }

    fn post(&self, text: &str) {
        if let Some(context) = &self.context {
            context.debug.post(text);
        }
    }
}

impl TeletypeRelay for DebugRelay {
    fn initialize(&mut self, context: RelayContext) {
        context.debug.post("Hoppie ACARS relay initialized");
        self.context = Some(context);
    }

    fn start(&mut self, callsign: &str) {
        self.post(&format!("Hoppie ACARS relay started for {}", callsign));
    }

    fn stop(&mut self) {
        self.post("Hoppie ACARS relay stopped");
    }
}
