//! Notification dispatchers.
//!
//! Each dispatcher delivers the final report through one channel. Failures
//! are returned as [`AppError::Notification`](crate::types::AppError); the
//! orchestrator records them and moves on to the next channel.

pub mod discord;
#[cfg(feature = "email")]
pub mod email;

use crate::types::Result;
use async_trait::async_trait;

pub use discord::DiscordWebhook;
#[cfg(feature = "email")]
pub use email::{EmailNotifier, EmailSettings};

/// One outbound channel for the final report.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Channel name used in logs and run output, e.g. `email`.
    fn channel(&self) -> &str;

    /// Deliver `report` for `topic`.
    async fn send(&self, report: &str, topic: &str) -> Result<()>;
}

/// Stands in for a channel whose feature is compiled out. Every send fails.
#[cfg(not(feature = "email"))]
pub struct DisabledChannel {
    channel: &'static str,
    reason: &'static str,
}

#[cfg(not(feature = "email"))]
impl DisabledChannel {
    pub fn new(channel: &'static str, reason: &'static str) -> Self {
        Self { channel, reason }
    }
}

#[cfg(not(feature = "email"))]
#[async_trait]
impl Notifier for DisabledChannel {
    fn channel(&self) -> &str {
        self.channel
    }

    async fn send(&self, _report: &str, _topic: &str) -> Result<()> {
        Err(crate::types::AppError::notification(self.channel, self.reason))
    }
}
