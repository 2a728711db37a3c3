//! The seams between the engine and its host application.
//!
//! The host owns the event source and a human-readable debug channel. Neither
//! is recreated here; the engine only needs a sink for diagnostic strings and
//! a registry to record which named handlers it wants events for.

use crate::core::{EventKind, HostEvent};
use std::collections::BTreeSet;
use tracing::info;

/// The host's single-argument debug-log channel.
pub trait DebugSink: Send + Sync {
    fn post(&self, text: &str);
}

/// Forwards debug messages to `tracing` under the `host_debug` target.
#[derive(Debug, Default, Clone)]
pub struct TracingDebugSink;

impl DebugSink for TracingDebugSink {
    fn post(&self, text: &str) {
        info!(target: "host_debug", "{}", text);
    }
}

/// A host event source that the engine registers handlers with.
///
/// Implementations guarantee sequential, non-overlapping delivery.
pub trait EventRegistry {
    fn subscribe(&mut self, kind: EventKind);
}

/// An in-process registry that remembers subscriptions and filters events.
#[derive(Debug, Default, Clone)]
pub struct Subscriptions {
    kinds: BTreeSet<EventKind>,
}

impl Subscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self, kind: EventKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Whether the event should be delivered to the engine.
    pub fn accepts(&self, event: &HostEvent) -> bool {
        self.is_subscribed(event.kind())
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn kinds(&self) -> impl Iterator<Item = EventKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl EventRegistry for Subscriptions {
    fn subscribe(&mut self, kind: EventKind) {
        self.kinds.insert(kind);
    }
}
