//! Fakes for the engine's collaborators.
#![allow(dead_code)]

use async_trait::async_trait;
use flight_notify::config::PluginSettings;
use flight_notify::core::{Notification, Notifier};
use flight_notify::host::DebugSink;
use flight_notify::notification::SendError;
use flight_notify::relay::{RelayContext, TeletypeRelay};
use std::sync::{Arc, Mutex};

/// A notifier that records every notification instead of sending it.
#[derive(Clone, Default)]
pub struct FakeNotifier {
    pub sent: Arc<Mutex<Vec<Notification>>>,
    pub fail: bool,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.sent().into_iter().map(|n| n.body).collect()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    fn name(&self) -> &str {
        "fake"
    }

    fn is_valid(&self) -> bool {
        true
    }

    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(notification.clone());
        if self.fail {
            return Err(SendError::Rejected("backend down".to_string()));
        }
        Ok(())
    }
}

/// Captures everything posted to the host debug channel.
#[derive(Clone, Default)]
pub struct RecordingSink {
    pub lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }
}

impl DebugSink for RecordingSink {
    fn post(&self, text: &str) {
        self.lines.lock().unwrap().push(text.to_string());
    }
}

/// Records the calls made into a teletype relay.
#[derive(Clone, Default)]
pub struct RecordingRelay {
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl RecordingRelay {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl TeletypeRelay for RecordingRelay {
    fn initialize(&mut self, context: RelayContext) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("initialize:{}", context.logon_code));
    }

    fn start(&mut self, callsign: &str) {
        self.calls.lock().unwrap().push(format!("start:{}", callsign));
    }

    fn stop(&mut self) {
        self.calls.lock().unwrap().push("stop".to_string());
    }
}

/// Settings with a valid Pushover configuration and every relay disabled.
pub fn pushover_settings() -> PluginSettings {
    let mut settings = PluginSettings::default();
    settings.general.driver = Some("pushover".to_string());
    settings.pushover.api_key = Some("app-token".to_string());
    settings.pushover.user_key = Some("user-key".to_string());
    settings
}
