//! HTTP client for a Slack incoming webhook.

use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::SlackError;
use crate::message::SlackMessage;

/// Posts [`SlackMessage`] payloads to one webhook URL.
///
/// A single POST is one attempt; retries live in [`crate::Escalator`].
pub struct SlackClient {
    client: Client,
    webhook_url: Url,
}

impl SlackClient {
    /// # Errors
    ///
    /// Returns [`SlackError::InvalidUrl`] if `webhook_url` does not parse, or
    /// [`SlackError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(webhook_url: &str, timeout_secs: u64) -> Result<Self, SlackError> {
        let webhook_url = Url::parse(webhook_url.trim())
            .map_err(|e| SlackError::InvalidUrl(format!("{e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.min(10)))
            .user_agent("sigtrack/0.1 (signal-escalation)")
            .build()?;

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Sends `message` as a JSON POST and requires a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`SlackError::Http`] on network failure, timeout, or a non-2xx
    /// status.
    pub async fn post(&self, message: &SlackMessage) -> Result<(), SlackError> {
        self.client
            .post(self.webhook_url.clone())
            .json(message)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
