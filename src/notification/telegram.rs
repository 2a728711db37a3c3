//! A client for sending notifications through a Telegram bot.

use super::driver::{is_blank, ConfigError, NotifierConfig};
use super::{ensure_success, SendError};
use crate::core::{Notification, Notifier, Priority};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, instrument};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

/// Sends messages through the Bot API `sendMessage` method.
#[derive(Debug, Clone)]
pub struct Telegram {
    client: reqwest::Client,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
}

impl Telegram {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            bot_token: None,
            chat_id: None,
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Replaces the driver's credentials and validates them.
    pub fn initialize(&mut self, config: &NotifierConfig) -> Result<(), ConfigError> {
        self.bot_token = config.telegram_bot_token.clone();
        self.chat_id = config.telegram_chat_id.clone();
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if is_blank(&self.bot_token) {
            missing.push("bot_token");
        }
        if is_blank(&self.chat_id) {
            missing.push("chat_id");
        }
        ConfigError::check("Telegram", missing)
    }

    fn url(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base,
            self.bot_token.as_deref().unwrap_or_default()
        )
    }

    fn payload(&self, notification: &Notification) -> Value {
        let text = match &notification.title {
            Some(title) => format!("{}\n{}", title, notification.body),
            None => notification.body.clone(),
        };
        let mut payload = json!({
            "chat_id": self.chat_id.as_deref().unwrap_or_default(),
            "text": text,
        });
        if notification.priority() == Priority::Normal {
            payload["disable_notification"] = Value::Bool(true);
        }
        payload
    }
}

#[async_trait]
impl Notifier for Telegram {
    fn name(&self) -> &str {
        "Telegram"
    }

    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    #[instrument(skip_all, fields(driver = "telegram"))]
    async fn send(&self, notification: &Notification) -> Result<(), SendError> {
        if !self.is_valid() {
            return Err(SendError::NotConfigured("Telegram"));
        }

        let response = self
            .client
            .post(self.url())
            .json(&self.payload(notification))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request to Telegram failed");
                SendError::from(e)
            })?;
        let response = ensure_success(response).await?;

        // The Bot API reports success in the body as well as the status.
        let body: ApiResponse = response.json().await?;
        if !body.ok {
            let reason = body.description.unwrap_or_else(|| "unknown error".to_string());
            error!(reason = %reason, "Telegram rejected the message");
            return Err(SendError::Rejected(reason));
        }

        info!("Successfully sent notification to Telegram.");
        Ok(())
    }
}
