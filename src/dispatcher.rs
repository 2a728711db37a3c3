//! The event dispatcher: maps host events to notifications.
//!
//! The dispatcher owns the session state (the connected callsign) and the
//! teletype relay lifecycle. Host events arrive one at a time through
//! [`EventDispatcher::handle`]; outbound sends are spawned on the
//! [`TaskManager`] so a slow backend never holds up the next event.

use crate::config::PluginSettings;
use crate::core::{HostEvent, Notification, Notifier, Priority};
use crate::host::DebugSink;
use crate::relay::RelayLifecycle;
use crate::task_manager::TaskManager;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub const DISCONNECTED_MESSAGE: &str = "Disconnected from network";
pub const DISCONNECTED_TITLE: &str = "vPilot";
pub const SELCAL_MESSAGE: &str = "SELCAL Alert";

/// Which events are relayed, fixed at activation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchRules {
    pub relay_private: bool,
    pub relay_radio: bool,
    pub relay_selcal: bool,
    pub disconnect_notice: bool,
}

impl From<&PluginSettings> for DispatchRules {
    fn from(settings: &PluginSettings) -> Self {
        Self {
            relay_private: settings.relay_private.enabled,
            relay_radio: settings.relay_radio.enabled,
            relay_selcal: settings.relay_selcal.enabled,
            disconnect_notice: settings.disconnect.enabled,
        }
    }
}

/// The callsign of the current network session, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    callsign: Option<String>,
}

impl SessionState {
    pub fn callsign(&self) -> Option<&str> {
        self.callsign.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.callsign.is_some()
    }
}

pub struct EventDispatcher {
    notifier: Arc<dyn Notifier>,
    debug: Arc<dyn DebugSink>,
    tasks: TaskManager,
    rules: DispatchRules,
    session: SessionState,
    relay: Option<RelayLifecycle>,
}

impl EventDispatcher {
    pub fn new(
        notifier: Arc<dyn Notifier>,
        debug: Arc<dyn DebugSink>,
        tasks: TaskManager,
        rules: DispatchRules,
    ) -> Self {
        Self {
            notifier,
            debug,
            tasks,
            rules,
            session: SessionState::default(),
            relay: None,
        }
    }

    /// Attaches an initialized teletype relay, started and stopped with the
    /// network session.
    pub fn with_relay(mut self, relay: RelayLifecycle) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn relay(&self) -> Option<&RelayLifecycle> {
        self.relay.as_ref()
    }

    /// Handles one host event. Never fails: send errors end up on the host
    /// debug channel.
    #[instrument(skip_all, fields(event = %event.kind()))]
    pub fn handle(&mut self, event: HostEvent) {
        match &event {
            HostEvent::Connected { callsign } => {
                info!(callsign = %callsign, "Connected to network");
                self.session.callsign = Some(callsign.clone());
                if let Some(relay) = &mut self.relay {
                    relay.start(callsign);
                }
            }
            HostEvent::Disconnected => {
                info!("Disconnected from network");
                self.session.callsign = None;
                if let Some(relay) = &mut self.relay {
                    relay.stop();
                }
            }
            _ => {}
        }

        if let Some(notification) = self.notification_for(&event) {
            self.dispatch(notification);
        }
    }

    /// Applies the relay rules to an event.
    ///
    /// Radio messages are relayed when their text contains the connected
    /// callsign anywhere, case-sensitively. This is a plain substring match, so
    /// a callsign mentioned in passing also triggers a relay.
    pub fn notification_for(&self, event: &HostEvent) -> Option<Notification> {
        match event {
            HostEvent::Connected { .. } => None,
            HostEvent::Disconnected => self.rules.disconnect_notice.then(|| {
                Notification::new(DISCONNECTED_MESSAGE)
                    .with_title(DISCONNECTED_TITLE)
                    .with_priority(Priority::High)
            }),
            HostEvent::PrivateMessage { from, message } => self
                .rules
                .relay_private
                .then(|| addressed(message, from)),
            HostEvent::RadioMessage { from, message } => {
                if !self.rules.relay_radio {
                    return None;
                }
                let callsign = self.session.callsign()?;
                if message.contains(callsign) {
                    Some(addressed(message, from))
                } else {
                    debug!("Radio message not addressed to {}, skipping.", callsign);
                    None
                }
            }
            HostEvent::SelcalAlert { from } => self
                .rules
                .relay_selcal
                .then(|| addressed(SELCAL_MESSAGE, from)),
        }
    }

    /// Sends a notification on a background task; failures are posted to the
    /// debug channel and never retried.
    pub fn dispatch(&self, notification: Notification) {
        send_in_background(&self.tasks, &self.notifier, &self.debug, notification);
    }
}

fn addressed(body: &str, from: &str) -> Notification {
    Notification::new(body)
        .with_title(from)
        .with_priority(Priority::High)
}

/// Spawns one send attempt for `notification` on `tasks`.
pub fn send_in_background(
    tasks: &TaskManager,
    notifier: &Arc<dyn Notifier>,
    debug: &Arc<dyn DebugSink>,
    notification: Notification,
) {
    let notifier = notifier.clone();
    let debug = debug.clone();
    tasks.spawn("send_notification", async move {
        match notifier.send(&notification).await {
            Ok(()) => debug!(driver = notifier.name(), "Notification delivered."),
            Err(e) => debug.post(&format!(
                "Failed to send notification via {}: {}",
                notifier.name(),
                e
            )),
        }
    });
}
