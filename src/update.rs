//! The one-shot update advisory.
//!
//! After activation the advisory fetches a plain-text version marker once and
//! compares it byte-for-byte with the running version. It is spawned as a
//! tracked task; on process exit it is simply abandoned.

use crate::config::UpdateSettings;
use crate::core::{Notification, Notifier};
use crate::host::DebugSink;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

pub const ADVISORY_TITLE: &str = "vPilot Notify Plugin";

/// The result of an update check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    UpToDate,
    UpdateAvailable(String),
    CheckFailed,
}

pub struct UpdateAdvisory {
    client: reqwest::Client,
    local_version: String,
    version_url: String,
    download_url: String,
    delay: Duration,
    notifier: Arc<dyn Notifier>,
    debug: Arc<dyn DebugSink>,
}

impl UpdateAdvisory {
    pub fn new(
        client: reqwest::Client,
        local_version: impl Into<String>,
        settings: &UpdateSettings,
        notifier: Arc<dyn Notifier>,
        debug: Arc<dyn DebugSink>,
    ) -> Self {
        Self {
            client,
            local_version: local_version.into(),
            version_url: settings.version_url.clone(),
            download_url: settings.download_url.clone(),
            delay: settings.delay(),
            notifier,
            debug,
        }
    }

    /// Overrides the delay between detecting an update and announcing it.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Runs the check once. Failures are logged and never retried.
    #[instrument(skip_all, fields(local = %self.local_version))]
    pub async fn run(self) -> UpdateOutcome {
        let remote = match self.fetch_marker().await {
            Ok(remote) => remote,
            Err(diagnostic) => {
                self.debug.post(&diagnostic);
                return UpdateOutcome::CheckFailed;
            }
        };

        if remote == self.local_version {
            info!("Running the latest version.");
            return UpdateOutcome::UpToDate;
        }

        // Let the "Connected" notification land first.
        tokio::time::sleep(self.delay).await;

        self.debug
            .post(&format!("Update available. Latest version is v{}", remote));
        let notification = Notification::new(format!(
            "Update available. Latest version is v{}. Download newest version at {}",
            remote, self.download_url
        ))
        .with_title(ADVISORY_TITLE);
        if let Err(e) = self.notifier.send(&notification).await {
            self.debug
                .post(&format!("[Update Checker] Failed to send update notice: {}", e));
        }

        UpdateOutcome::UpdateAvailable(remote)
    }

    async fn fetch_marker(&self) -> Result<String, String> {
        let response = self
            .client
            .get(&self.version_url)
            .send()
            .await
            .map_err(|e| format!("[Update Checker] An HTTP error occurred: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!(
                "[Update Checker] HTTP request failed with status code: {}",
                status
            ));
        }

        response
            .text()
            .await
            .map_err(|e| format!("[Update Checker] An HTTP error occurred: {}", e))
    }
}
