//! Wiring a [`ResearchPipeline`] from a loaded [`ResearchConfig`].

use super::orchestrator::ResearchPipeline;
use crate::db::MemoryStore;
use crate::llm::LLMClient;
use crate::notify::{DiscordWebhook, Notifier};
use crate::sources::academic::ArxivSearch;
use crate::sources::encyclopedia::WikipediaSearch;
use crate::sources::video::YouTubeSearch;
use crate::sources::{SourceConnector, SourceSet};
use crate::types::{AppError, Result, SourceKind};
use crate::utils::toml_config::{DiscordConfig, EmailConfig, ResearchConfig};
use std::sync::Arc;
use std::time::Duration;

fn env_value(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

impl ResearchPipeline {
    /// Build every collaborator named by `config`.
    ///
    /// Missing source credentials are tolerated here; the affected step
    /// fails when it runs. A missing Pinecone key fails immediately since
    /// recall is the second step of every run.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let llm = build_llm(config)?;
        let sources = build_sources(config)?;
        let store: Arc<dyn MemoryStore> = Arc::from(config.memory.create_store()?);

        tracing::info!(
            model = %config.llm.model,
            web_backend = config.search.name(),
            memory = config.memory.name(),
            "Pipeline configured"
        );

        let pipeline = build_notifiers(config)?.into_iter().fold(
            ResearchPipeline::new(llm, sources, store, config.research.pipeline_options()),
            ResearchPipeline::with_notifier,
        );
        Ok(pipeline)
    }
}

#[cfg(feature = "ollama")]
fn build_llm(config: &ResearchConfig) -> Result<Arc<dyn LLMClient>> {
    let client = crate::llm::ollama::OllamaClient::new(&config.llm.to_settings())?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "ollama"))]
fn build_llm(_config: &ResearchConfig) -> Result<Arc<dyn LLMClient>> {
    Err(AppError::Configuration(
        "no reasoning service compiled in; enable the 'ollama' feature".into(),
    ))
}

fn build_sources(config: &ResearchConfig) -> Result<SourceSet> {
    let research = &config.research;

    let web = config
        .search
        .build(research.connector_settings(SourceKind::Web))?;

    let video: Arc<dyn SourceConnector> = Arc::new(YouTubeSearch::new(
        env_value(&config.youtube.api_key_env),
        config.youtube.api_key_env.clone(),
        research.connector_settings(SourceKind::Video),
        research.transcript_timeout(),
    )?);

    let encyclopedia: Arc<dyn SourceConnector> = Arc::new(WikipediaSearch::new(
        research.connector_settings(SourceKind::Encyclopedia),
    )?);

    let academic: Arc<dyn SourceConnector> = Arc::new(ArxivSearch::new(
        research.connector_settings(SourceKind::Academic),
    )?);

    Ok(SourceSet::new(web, video, encyclopedia, academic))
}

/// Email first, then the webhook. Both are always built; a channel with no
/// recipient or URL fails when it sends.
fn build_notifiers(config: &ResearchConfig) -> Result<Vec<Arc<dyn Notifier>>> {
    Ok(vec![
        build_email(&config.notify.email),
        Arc::new(build_webhook(&config.notify.discord)?),
    ])
}

#[cfg(feature = "email")]
fn build_email(email: &EmailConfig) -> Arc<dyn Notifier> {
    use crate::notify::{EmailNotifier, EmailSettings};
    Arc::new(EmailNotifier::new(EmailSettings {
        recipient: email.recipient.clone(),
        smtp_server: email.smtp_server.clone(),
        smtp_port: email.smtp_port,
        username: env_value(&email.username_env),
        password: env_value(&email.password_env),
        from: email.from.clone(),
        timeout: Duration::from_secs(email.timeout_secs),
    }))
}

#[cfg(not(feature = "email"))]
fn build_email(_email: &EmailConfig) -> Arc<dyn Notifier> {
    Arc::new(crate::notify::DisabledChannel::new(
        "email",
        "built without the 'email' feature",
    ))
}

fn build_webhook(discord: &DiscordConfig) -> Result<DiscordWebhook> {
    DiscordWebhook::new(
        env_value(&discord.webhook_url_env),
        discord.webhook_url_env.clone(),
        discord.message.clone(),
        Duration::from_secs(discord.timeout_secs),
    )
    .map_err(|e| AppError::Configuration(e.to_string()))
}
