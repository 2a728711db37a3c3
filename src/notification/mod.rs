//! Outbound notification drivers.
//!
//! Each backend variant lives in its own module and implements the
//! [`Notifier`](crate::core::Notifier) trait. The closed set of variants is
//! tied together by [`driver::NotifierDriver`], which is selected once at
//! activation.
pub mod driver;
pub mod gotify;
pub mod pushover;
pub mod telegram;

use reqwest::{Response, StatusCode};
use std::time::Duration;
use thiserror::Error;

/// Upper bound for a single outbound call.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Reasons a single send attempt can fail.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("{0} driver is not configured")]
    NotConfigured(&'static str),
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend responded with status {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("backend rejected the message: {0}")]
    Rejected(String),
}

impl SendError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SendError::Transport(e) if e.is_timeout())
    }
}

/// Builds the HTTP client shared by every driver.
pub fn http_client() -> reqwest::Client {
    http_client_with_timeout(SEND_TIMEOUT)
}

pub fn http_client_with_timeout(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// Turns a non-2xx response into a [`SendError::Status`].
async fn ensure_success(response: Response) -> Result<Response, SendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(SendError::Status { status, body })
}
