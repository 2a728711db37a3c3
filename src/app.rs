//! Activation: the one-time startup sequence that wires settings, driver,
//! subscriptions, relay and update advisory together.
//!
//! Activation is a strict gate. No event subscription, relay initialization or
//! update check happens unless the driver was selected and validated.

use crate::{
    config::{PluginSettings, SettingsError},
    core::{EventKind, HostEvent, Notification, Notifier},
    dispatcher::{send_in_background, DispatchRules, EventDispatcher},
    host::{DebugSink, EventRegistry, TracingDebugSink},
    notification::{
        driver::{select_driver, SelectionError},
        http_client,
    },
    relay::{RelayContext, RelayLifecycle, TeletypeRelay},
    task_manager::TaskManager,
    update::UpdateAdvisory,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HOPPIE_LOGON_MISSING: &str = "Hoppie logon code not set. Check your flight-notify.toml";
pub const PLUGIN_LOAD_FAILED: &str = "Plugin failed to load. Check your flight-notify.toml";

/// Reasons activation was refused.
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Driver(#[from] SelectionError),
    #[error("{}", HOPPIE_LOGON_MISSING)]
    MissingRelayLogon,
}

/// A fully activated engine.
pub struct App {
    dispatcher: EventDispatcher,
    tasks: TaskManager,
}

impl App {
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    /// Delivers one host event.
    pub fn handle(&mut self, event: HostEvent) {
        self.dispatcher.handle(event);
    }

    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.dispatcher
    }

    pub fn tasks(&self) -> &TaskManager {
        &self.tasks
    }

    /// Waits for outstanding sends and the update advisory, or abandons them
    /// if shutdown was signalled.
    pub async fn shutdown(self) {
        self.tasks.shutdown().await;
    }
}

/// Builder for an activation.
///
/// Components can be overridden for testing; by default the driver is
/// selected from the settings and diagnostics go to `tracing`.
pub struct AppBuilder {
    settings: Option<Result<PluginSettings, SettingsError>>,
    debug: Arc<dyn DebugSink>,
    notifier_override: Option<Arc<dyn Notifier>>,
    relay: Option<Box<dyn TeletypeRelay>>,
    client: Option<reqwest::Client>,
    tasks: Option<TaskManager>,
    update_check: bool,
    local_version: String,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            settings: None,
            debug: Arc::new(TracingDebugSink),
            notifier_override: None,
            relay: None,
            client: None,
            tasks: None,
            update_check: true,
            local_version: VERSION.to_string(),
        }
    }

    pub fn settings(mut self, settings: PluginSettings) -> Self {
        self.settings = Some(Ok(settings));
        self
    }

    /// Uses the result of reading the settings store; an error fails
    /// activation as a whole.
    pub fn settings_result(mut self, settings: Result<PluginSettings, SettingsError>) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn debug_sink(mut self, debug: Arc<dyn DebugSink>) -> Self {
        self.debug = debug;
        self
    }

    /// Overrides the notifier for testing. Driver selection still runs.
    pub fn notifier_override(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier_override = Some(notifier);
        self
    }

    /// The teletype relay collaborator used when the relay is enabled.
    pub fn relay(mut self, relay: Box<dyn TeletypeRelay>) -> Self {
        self.relay = Some(relay);
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// The task manager that tracks sends and the update advisory.
    pub fn task_manager(mut self, tasks: TaskManager) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Enables or disables the post-activation update check.
    pub fn update_check(mut self, enabled: bool) -> Self {
        self.update_check = enabled;
        self
    }

    pub fn local_version(mut self, version: impl Into<String>) -> Self {
        self.local_version = version.into();
        self
    }

    /// Runs the activation sequence, registering handlers with `registry`
    /// only once everything has been validated.
    #[instrument(skip_all)]
    pub fn activate(self, registry: &mut dyn EventRegistry) -> Result<App, ActivationError> {
        let debug = self.debug.clone();
        let result = self.activate_inner(registry);
        if let Err(e) = &result {
            error!(error = %e, "Activation failed");
            if matches!(e, ActivationError::Settings(_)) {
                debug.post(PLUGIN_LOAD_FAILED);
            } else {
                debug.post(&e.to_string());
            }
        }
        result
    }

    fn activate_inner(self, registry: &mut dyn EventRegistry) -> Result<App, ActivationError> {
        let settings = self
            .settings
            .unwrap_or_else(|| Err(SettingsError::StoreUnavailable(Default::default())))?;
        let client = self.client.unwrap_or_else(http_client);
        let tasks = self.tasks.unwrap_or_else(TaskManager::detached);

        // 1. Driver selection and validation
        let driver = select_driver(&settings, client.clone())?;
        self.debug.post(&format!("Driver set to {}", driver.kind()));
        let notifier: Arc<dyn Notifier> = match self.notifier_override {
            Some(notifier) => notifier,
            None => Arc::new(driver),
        };

        // 2. Relay prerequisites
        let logon_code = match (settings.hoppie.enabled, &settings.hoppie.logon_code) {
            (true, None) => {
                send_in_background(
                    &tasks,
                    &notifier,
                    &self.debug,
                    Notification::new(HOPPIE_LOGON_MISSING),
                );
                return Err(ActivationError::MissingRelayLogon);
            }
            (true, Some(code)) => Some(code.clone()),
            (false, _) => None,
        };

        // 3. Event subscriptions
        let rules = DispatchRules::from(&settings);
        registry.subscribe(EventKind::Connected);
        registry.subscribe(EventKind::Disconnected);
        if rules.relay_private {
            registry.subscribe(EventKind::PrivateMessage);
        }
        if rules.relay_radio {
            registry.subscribe(EventKind::RadioMessage);
        }
        if rules.relay_selcal {
            registry.subscribe(EventKind::SelcalAlert);
        }

        // 4. Teletype relay
        let mut dispatcher =
            EventDispatcher::new(notifier.clone(), self.debug.clone(), tasks.clone(), rules);
        if let Some(logon_code) = logon_code {
            match self.relay {
                Some(relay) => {
                    let mut lifecycle = RelayLifecycle::new(relay);
                    lifecycle.initialize(RelayContext {
                        notifier: notifier.clone(),
                        debug: self.debug.clone(),
                        logon_code,
                    });
                    dispatcher = dispatcher.with_relay(lifecycle);
                }
                None => self
                    .debug
                    .post("Hoppie relay enabled but no relay client is available"),
            }
        }

        // 5. Announce
        dispatcher.dispatch(Notification::new(format!(
            "Connected. Running version v{}",
            self.local_version
        )));
        self.debug.post(&format!(
            "Notify plugin connected and enabled on v{}",
            self.local_version
        ));
        info!(version = %self.local_version, "Activation complete");

        // 6. Update advisory
        if self.update_check {
            let advisory = UpdateAdvisory::new(
                client,
                self.local_version.clone(),
                &settings.update,
                notifier,
                self.debug.clone(),
            );
            tasks.spawn("update_advisory", async move {
                let outcome = advisory.run().await;
                info!(?outcome, "Update check finished");
            });
        }

        Ok(App { dispatcher, tasks })
    }
}
