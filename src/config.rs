//! Configuration management for flight-notify
//!
//! This module defines the `PluginSettings` struct and its sections. Settings
//! are loaded exactly once with `figment`: defaults, then the TOML settings
//! file, then `FLIGHT_NOTIFY_` environment variables, then CLI overrides.

use crate::cli::Cli;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SETTINGS_FILE: &str = "flight-notify.toml";

/// Errors raised while reading the settings store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file not found at {0}")]
    StoreUnavailable(PathBuf),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] Box<figment::Error>),
}

/// The flat, read-once record of every recognized option.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PluginSettings {
    /// The logging level for the binary.
    pub log_level: String,
    pub general: GeneralSettings,
    pub pushover: PushoverSettings,
    pub telegram: TelegramSettings,
    pub gotify: GotifySettings,
    pub hoppie: HoppieSettings,
    pub relay_private: FeatureFlag,
    pub relay_radio: FeatureFlag,
    pub relay_selcal: FeatureFlag,
    pub disconnect: FeatureFlag,
    pub update: UpdateSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GeneralSettings {
    /// Driver selection: "pushover", "telegram" or "gotify" (any case).
    #[serde(deserialize_with = "non_empty")]
    pub driver: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct PushoverSettings {
    #[serde(deserialize_with = "non_empty")]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub user_key: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub device: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct TelegramSettings {
    #[serde(deserialize_with = "non_empty")]
    pub bot_token: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub chat_id: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GotifySettings {
    #[serde(deserialize_with = "non_empty")]
    pub url: Option<String>,
    #[serde(deserialize_with = "non_empty")]
    pub token: Option<String>,
}

/// The long-range teletype (Hoppie ACARS) relay.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct HoppieSettings {
    pub enabled: bool,
    #[serde(deserialize_with = "non_empty")]
    pub logon_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq)]
#[serde(default)]
pub struct FeatureFlag {
    pub enabled: bool,
}

/// Settings for the update advisory.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct UpdateSettings {
    /// Plain-text resource holding the latest released version.
    pub version_url: String,
    /// Where users are pointed to when an update is available.
    pub download_url: String,
    /// Delay before the advisory is sent, so it lands after "Connected".
    pub delay_seconds: u64,
}

impl UpdateSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            version_url: "https://raw.githubusercontent.com/blt950/vPilot-Pushover/main/version.txt"
                .to_string(),
            download_url: "https://blt950.com".to_string(),
            delay_seconds: 5,
        }
    }
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            general: GeneralSettings::default(),
            pushover: PushoverSettings::default(),
            telegram: TelegramSettings::default(),
            gotify: GotifySettings::default(),
            hoppie: HoppieSettings::default(),
            relay_private: FeatureFlag::default(),
            relay_radio: FeatureFlag::default(),
            relay_selcal: FeatureFlag::default(),
            disconnect: FeatureFlag::default(),
            update: UpdateSettings::default(),
        }
    }
}

impl PluginSettings {
    /// Loads settings by layering defaults, the settings file, environment
    /// variables and command-line overrides.
    ///
    /// The settings file must exist: a missing store fails activation as a
    /// whole rather than silently running on defaults.
    pub fn load(cli: &Cli) -> Result<Self, SettingsError> {
        let path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
        Self::figment(&path)
            .map(|figment| figment.merge(cli.clone()))?
            .extract()
            .map_err(|e| SettingsError::Parse(Box::new(e)))
    }

    /// Loads settings from a file and the environment only.
    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        Self::figment(path)?
            .extract()
            .map_err(|e| SettingsError::Parse(Box::new(e)))
    }

    fn figment(path: &Path) -> Result<Figment, SettingsError> {
        if !path.is_file() {
            return Err(SettingsError::StoreUnavailable(path.to_path_buf()));
        }
        Ok(Figment::new()
            .merge(Serialized::defaults(PluginSettings::default()))
            .merge(Toml::file(path))
            // e.g. FLIGHT_NOTIFY_PUSHOVER__API_KEY=...
            .merge(Env::prefixed("FLIGHT_NOTIFY_").split("__")))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Integer(i64),
}

/// Treats empty and whitespace-only strings as absent.
///
/// Numeric values (e.g. a Telegram chat id written without quotes) are kept
/// as their decimal text.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Text(s) => s,
        Scalar::Integer(n) => n.to_string(),
    });
    Ok(value.filter(|s| !s.trim().is_empty()))
}
