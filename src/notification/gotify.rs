//! A client for a self-hosted Gotify server.

use super::driver::{is_blank, ConfigError, NotifierConfig};
use super::{ensure_success, SendError};
use crate::core::{Notification, Notifier, Priority};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

#[derive(Debug, Clone)]
pub struct Gotify {
    client: reqwest::Client,
    url: Option<String>,
    token: Option<String>,
}

impl Gotify {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: None,
            token: None,
        }
    }

    /// Replaces the driver's server and token and validates them.
    pub fn initialize(&mut self, config: &NotifierConfig) -> Result<(), ConfigError> {
        self.url = config
            .gotify_url
            .as_deref()
            .map(|url| url.trim_end_matches('/').to_string());
        self.token = config.gotify_token.clone();
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_blank(&self.url) {
            missing.push("url");
        }
        if is_blank(&self.token) {
            missing.push("token");
        }
        ConfigError::check("Gotify", missing)
    }

    fn payload(notification: &Notification) -> Value {
        let priority = match notification.priority() {
            Priority::Normal => 5,
            Priority::High => 8,
        };
        let mut payload = json!({
            "message": notification.body,
            "priority": priority,
        });
        if let Some(title) = &notification.title {
            payload["title"] = Value::String(title.clone());
        }
        payload
    }
}

#[async_trait]
impl Notifier for Gotify {
    fn name(&self) -> &str {
        "Gotify"
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    #[instrument(skip_all, fields(driver = "gotify"))]
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        if !self.is_valid() {
            return Err(SendError::NotConfigured("Gotify"));
        }
        let url = self.url.as_deref().unwrap_or_default();
        let token = self.token.as_deref().unwrap_or_default();

        let response = self
            .client
            .post(format!("{}/message", url))
            .query(&[("token", token)])
            .json(&Self::payload(notification))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Gotify failed");
                SendError::from(e)
            })?;
        ensure_success(response).await?;

        info!("Successfully sent notification to Gotify.");
        Ok(())
    }
}
