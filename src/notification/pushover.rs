//! A client for sending notifications through Pushover.

use super::driver::{is_blank, ConfigError, NotifierConfig};
use super::{ensure_success, SendError};
use crate::core::{Notification, Notifier, Priority};
use async_trait::async_trait;
use tracing::{error, info, instrument};

pub const PUSHOVER_ENDPOINT: &str = "https://api.pushover.net/1/messages.json";

/// Sends form-encoded messages to the Pushover messages API.
#[derive(Debug, Clone)]
pub struct Pushover {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
    user: Option<String>,
    device: Option<String>,
}

impl Pushover {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: PUSHOVER_ENDPOINT.to_string(),
            token: None,
            user: None,
            device: None,
        }
    }

    /// Points the driver at a different messages endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Replaces the driver's credentials and validates them.
    pub fn initialize(&mut self, config: &NotifierConfig) -> Result<(), ConfigError> {
        self.token = config.pushover_token.clone();
        self.user = config.pushover_user.clone();
        self.device = config.pushover_device.clone();
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_blank(&self.token) {
            missing.push("api_key");
        }
        if is_blank(&self.user) {
            missing.push("user_key");
        }
        ConfigError::check("Pushover", missing)
    }

    fn form(&self, notification: &Notification) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("token", self.token.clone().unwrap_or_default()),
            ("user", self.user.clone().unwrap_or_default()),
            ("message", notification.body.clone()),
        ];
        if let Some(title) = &notification.title {
            form.push(("title", title.clone()));
        }
        if let Some(priority) = notification.priority {
            let value = match priority {
                Priority::Normal => "0",
                Priority::High => "1",
            };
            form.push(("priority", value.to_string()));
        }
        if let Some(device) = &self.device {
            form.push(("device", device.clone()));
        }
        form
    }
}

#[async_trait]
impl Notifier for Pushover {
    fn name(&self) -> &str {
        "Pushover"
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    #[instrument(skip_all, fields(driver = "pushover"))]
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        if !self.is_valid() {
            return Err(SendError::NotConfigured("Pushover"));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .form(&self.form(notification))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Pushover failed");
                SendError::from(e)
            })?;
        ensure_success(response).await?;

        info!("Successfully sent notification to Pushover.");
        Ok(())
    }
}
