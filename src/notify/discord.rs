//! Chat webhook dispatcher (Discord-compatible).
//!
//! Posts a short message with the report attached as `summary.txt`.

use super::Notifier;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use std::time::Duration;

const CHANNEL: &str = "discord";
pub const DEFAULT_MESSAGE: &str = "Here’s the latest research summary:";
const ATTACHMENT_NAME: &str = "summary.txt";

pub struct DiscordWebhook {
    client: reqwest::Client,
    webhook_url: Option<String>,
    webhook_url_env: String,
    message: String,
}

impl DiscordWebhook {
    pub fn new(
        webhook_url: Option<String>,
        webhook_url_env: impl Into<String>,
        message: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::notification(CHANNEL, format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            webhook_url,
            webhook_url_env: webhook_url_env.into(),
            message: message.into(),
        })
    }

    fn form(&self, report: &str) -> Result<Form> {
        let attachment = Part::text(report.to_string())
            .file_name(ATTACHMENT_NAME)
            .mime_str("text/plain")
            .map_err(|e| AppError::notification(CHANNEL, e))?;

        Ok(Form::new()
            .text("payload_json", json!({ "content": self.message }).to_string())
            .part("file", attachment))
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    fn channel(&self) -> &str {
        CHANNEL
    }

    async fn send(&self, report: &str, _topic: &str) -> Result<()> {
        let url = self
            .webhook_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| {
                AppError::notification(
                    CHANNEL,
                    format!("webhook URL not set in environment variable '{}'", self.webhook_url_env),
                )
            })?;

        let response = self
            .client
            .post(url)
            .multipart(self.form(report)?)
            .send()
            .await
            .map_err(|e| AppError::notification(CHANNEL, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::notification(
                CHANNEL,
                format!("webhook returned {}: {}", status, body),
            ));
        }

        tracing::info!(status = %status, "Report posted to webhook");
        Ok(())
    }
}
