//! Core domain types and service traits for flight-notify
//!
//! This module defines the host events the engine reacts to, the notification
//! payload handed to a backend, and the trait contracts that govern how the
//! dispatcher talks to drivers.

use crate::notification::SendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Delivery priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    #[default]
    Normal,
    /// Used for everything addressed to the pilot (private messages, SELCAL, ...).
    High,
}

/// A single outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub body: String,
    pub title: Option<String>,
    pub priority: Option<Priority>,
}

impl Notification {
    /// Creates a notification carrying only a body.
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            title: None,
            priority: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// The effective priority, falling back to `Normal`.
    pub fn priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }
}

/// An event raised by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Connected { callsign: String },
    Disconnected,
    PrivateMessage { from: String, message: String },
    RadioMessage { from: String, message: String },
    SelcalAlert { from: String },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Connected { .. } => EventKind::Connected,
            HostEvent::Disconnected => EventKind::Disconnected,
            HostEvent::PrivateMessage { .. } => EventKind::PrivateMessage,
            HostEvent::RadioMessage { .. } => EventKind::RadioMessage,
            HostEvent::SelcalAlert { .. } => EventKind::SelcalAlert,
        }
    }
}

/// The named handlers a host can deliver events to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Connected,
    Disconnected,
    PrivateMessage,
    RadioMessage,
    SelcalAlert,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventKind::Connected => "network-connected",
            EventKind::Disconnected => "network-disconnected",
            EventKind::PrivateMessage => "private-message",
            EventKind::RadioMessage => "radio-message",
            EventKind::SelcalAlert => "selcal-alert",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Sends notifications to an outbound backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A short, human-readable backend name (e.g. "Pushover").
    fn name(&self) -> &str;

    /// Whether every required configuration field is present.
    ///
    /// This is a pure check and never performs network I/O.
    fn is_valid(&self) -> bool;

    /// Performs exactly one outbound call for the notification.
    ///
    /// # Returns
    /// * `Ok(())` if the backend accepted the message
    /// * `Err` on transport errors, non-2xx responses or API rejections
    async fn send(&self, notification: &Notification) -> Result<(), SendError>;
}
