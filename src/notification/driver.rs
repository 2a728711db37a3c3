//! Driver registry: selects, configures and validates exactly one backend.

use super::gotify::Gotify;
use super::pushover::Pushover;
use super::telegram::Telegram;
use super::SendError;
use crate::config::PluginSettings;
use crate::core::{Notification, Notifier};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverKind {
    Pushover,
    Telegram,
    Gotify,
}

impl FromStr for DriverKind {
    type Err = SelectionError;

    /// Parses a driver selection, ignoring case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pushover" => Ok(DriverKind::Pushover),
            "telegram" => Ok(DriverKind::Telegram),
            "gotify" => Ok(DriverKind::Gotify),
            _ => Err(SelectionError::UnknownDriver(Some(s.to_string()))),
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DriverKind::Pushover => "Pushover",
            DriverKind::Telegram => "Telegram",
            DriverKind::Gotify => "Gotify",
        };
        f.write_str(name)
    }
}

/// Credentials for every backend; only the selected variant's are populated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifierConfig {
    pub pushover_token: Option<String>,
    pub pushover_user: Option<String>,
    pub pushover_device: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub gotify_url: Option<String>,
    pub gotify_token: Option<String>,
}

impl NotifierConfig {
    /// Builds the subset of settings relevant to `kind`.
    pub fn for_driver(kind: DriverKind, settings: &PluginSettings) -> Self {
        match kind {
            DriverKind::Pushover => Self {
                pushover_token: settings.pushover.api_key.clone(),
                pushover_user: settings.pushover.user_key.clone(),
                pushover_device: settings.pushover.device.clone(),
                ..Default::default()
            },
            DriverKind::Telegram => Self {
                telegram_bot_token: settings.telegram.bot_token.clone(),
                telegram_chat_id: settings.telegram.chat_id.clone(),
                ..Default::default()
            },
            DriverKind::Gotify => Self {
                gotify_url: settings.gotify.url.clone(),
                gotify_token: settings.gotify.token.clone(),
                ..Default::default()
            },
        }
    }
}

/// Required fields missing from a driver's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{driver} is missing required settings: {}", .missing.join(", "))]
pub struct ConfigError {
    pub driver: &'static str,
    pub missing: Vec<&'static str>,
}

impl ConfigError {
    pub(crate) fn check(driver: &'static str, missing: Vec<&'static str>) -> Result<(), Self> {
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Self { driver, missing })
        }
    }
}

pub(crate) fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

/// Why driver selection failed. The `Display` text is the diagnostic posted
/// to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Driver not set correctly. Check your flight-notify.toml")]
    UnknownDriver(Option<String>),
    #[error("{}", invalid_config_message(.kind))]
    InvalidConfig {
        kind: DriverKind,
        #[source]
        source: ConfigError,
    },
}

fn invalid_config_message(kind: &DriverKind) -> &'static str {
    match kind {
        DriverKind::Pushover => "Pushover API key or user key not set. Check your flight-notify.toml",
        DriverKind::Telegram => "Telegram bot token or chat ID not set. Check your flight-notify.toml",
        DriverKind::Gotify => "Invalid Gotify server URL or app token. Check your flight-notify.toml",
    }
}

/// The live notifier, one of the supported backends.
#[derive(Debug, Clone)]
pub enum NotifierDriver {
    Pushover(Pushover),
    Telegram(Telegram),
    Gotify(Gotify),
}

impl NotifierDriver {
    /// Creates an unconfigured driver of the given kind.
    pub fn new(kind: DriverKind, client: reqwest::Client) -> Self {
        match kind {
            DriverKind::Pushover => NotifierDriver::Pushover(Pushover::new(client)),
            DriverKind::Telegram => NotifierDriver::Telegram(Telegram::new(client)),
            DriverKind::Gotify => NotifierDriver::Gotify(Gotify::new(client)),
        }
    }

    pub fn kind(&self) -> DriverKind {
        match self {
            NotifierDriver::Pushover(_) => DriverKind::Pushover,
            NotifierDriver::Telegram(_) => DriverKind::Telegram,
            NotifierDriver::Gotify(_) => DriverKind::Gotify,
        }
    }

    /// Applies `config` and reports whether the required fields are present.
    ///
    /// Calling this repeatedly with the same config yields the same result.
    pub fn initialize(&mut self, config: &NotifierConfig) -> Result<(), ConfigError> {
        match self {
            NotifierDriver::Pushover(d) => d.initialize(config),
            NotifierDriver::Telegram(d) => d.initialize(config),
            NotifierDriver::Gotify(d) => d.initialize(config),
        }
    }

    fn inner(&self) -> &dyn Notifier {
        match self {
            NotifierDriver::Pushover(d) => d,
            NotifierDriver::Telegram(d) => d,
            NotifierDriver::Gotify(d) => d,
        }
    }
}

#[async_trait]
impl Notifier for NotifierDriver {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn is_valid(&self) -> bool {
        self.inner().is_valid()
    }

    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        self.inner().send(notification).await
    }
}

/// Selects the driver named in the settings and validates its configuration.
///
/// An absent or unrecognized selection fails before any driver is built; a
/// recognized selection with missing credentials fails after construction.
pub fn select_driver(
    settings: &PluginSettings,
    client: reqwest::Client,
) -> Result<NotifierDriver, SelectionError> {
    let kind: DriverKind = settings
        .general
        .driver
        .as_deref()
        .ok_or(SelectionError::UnknownDriver(None))?
        .parse()?;

    let mut driver = NotifierDriver::new(kind, client);
    let config = NotifierConfig::for_driver(kind, settings);
    driver
        .initialize(&config)
        .map_err(|source| SelectionError::InvalidConfig { kind, source })?;
    debug_assert!(driver.is_valid());
    Ok(driver)
}
