//! SMTP email dispatcher.

use super::Notifier;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;

const CHANNEL: &str = "email";
const FALLBACK_SENDER: &str = "no-reply@example.com";

/// Resolved SMTP settings. Credentials are optional; login happens only when
/// both are present.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailSettings {
    pub recipient: String,
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub timeout: Duration,
}

impl EmailSettings {
    /// Explicit sender, else the SMTP username, else a no-reply address.
    pub fn sender(&self) -> &str {
        self.from
            .as_deref()
            .or(self.username.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(FALLBACK_SENDER)
    }

    fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
                Some(Credentials::new(user.clone(), pass.clone()))
            }
            _ => None,
        }
    }
}

pub struct EmailNotifier {
    settings: EmailSettings,
}

impl EmailNotifier {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    /// Build the message without sending it.
    pub fn build_message(&self, report: &str, topic: &str) -> Result<Message> {
        if self.settings.recipient.trim().is_empty() {
            return Err(AppError::notification(CHANNEL, "no recipient configured"));
        }

        let from: Mailbox = self
            .settings
            .sender()
            .parse()
            .map_err(|e| AppError::notification(CHANNEL, format!("invalid sender address: {}", e)))?;
        let to: Mailbox = self
            .settings
            .recipient
            .parse()
            .map_err(|e| AppError::notification(CHANNEL, format!("invalid recipient address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(format!("Research Summary: {}", topic))
            .header(ContentType::TEXT_PLAIN)
            .body(report.to_string())
            .map_err(|e| AppError::notification(CHANNEL, format!("failed to build email: {}", e)))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    fn channel(&self) -> &str {
        CHANNEL
    }

    async fn send(&self, report: &str, topic: &str) -> Result<()> {
        let email = self.build_message(report, topic)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_server)
            .map_err(|e| AppError::notification(CHANNEL, format!("SMTP relay error: {}", e)))?
            .port(self.settings.smtp_port)
            .timeout(Some(self.settings.timeout));
        if let Some(credentials) = self.settings.credentials() {
            builder = builder.credentials(credentials);
        }
        let mailer = builder.build();

        let response = mailer
            .send(email)
            .await
            .map_err(|e| AppError::notification(CHANNEL, format!("SMTP send error: {}", e)))?;

        tracing::info!(
            recipient = %self.settings.recipient,
            code = %response.code(),
            "Report emailed"
        );
        Ok(())
    }
}
