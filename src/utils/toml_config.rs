//! TOML-based configuration for deep-research
//!
//! Everything a run needs is declared in `research.toml`. Secrets never live
//! in the file; sections name the environment variable holding them
//! (`*_env` keys), and the variables are read when collaborators are built.
//!
//! An unset variable is only a warning at load time. The step that needs the
//! secret fails with a configuration error when it is about to run.

use crate::db::MemoryStoreProvider;
use crate::llm::LLMSettings;
use crate::pipeline::PipelineOptions;
use crate::sources::web::WebBackendConfig;
use crate::sources::ConnectorSettings;
use crate::types::{AppError, SourceKind};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest accepted `max_loops`. Each loop is a full fetch cycle.
pub const MAX_LOOPS_LIMIT: u32 = 20;

/// Highest accepted per-source token budget.
pub const MAX_TOKENS_LIMIT: usize = 100_000;

/// Root configuration structure loaded from research.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub research: ResearchSettings,

    /// Web search backend, chosen by `backend = "..."`
    #[serde(default)]
    pub search: WebBackendConfig,

    #[serde(default)]
    pub youtube: YouTubeConfig,

    /// Memory store, chosen by `provider = "..."`
    #[serde(default)]
    pub memory: MemoryStoreProvider,

    #[serde(default)]
    pub notify: NotifyConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            llm: LlmConfig::default(),
            research: ResearchSettings::default(),
            search: WebBackendConfig::default(),
            youtube: YouTubeConfig::default(),
            memory: MemoryStoreProvider::default(),
            notify: NotifyConfig::default(),
        }
    }
}

// ============= Reasoning Service =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Every request runs at zero; any other value is rejected at load.
    #[serde(default)]
    pub temperature: f32,
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_url(),
            model: default_model(),
            temperature: 0.0,
        }
    }
}

impl LlmConfig {
    pub fn to_settings(&self) -> LLMSettings {
        LLMSettings {
            base_url: self.base_url.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
        }
    }
}

// ============= Research Loop =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchSettings {
    /// Reflection loops back while the completed cycle count is at most
    /// this value, so `max_loops + 1` cycles run.
    #[serde(default = "default_max_loops")]
    pub max_loops: u32,

    #[serde(default = "default_recall_top_k")]
    pub recall_top_k: usize,

    #[serde(default = "default_source_timeout")]
    pub source_timeout_secs: u64,

    #[serde(default = "default_transcript_timeout")]
    pub transcript_timeout_secs: u64,

    #[serde(default = "default_web_max_results")]
    pub web_max_results: usize,

    #[serde(default = "default_max_results")]
    pub video_max_results: usize,

    #[serde(default = "default_max_results")]
    pub encyclopedia_max_results: usize,

    #[serde(default = "default_max_results")]
    pub academic_max_results: usize,

    #[serde(default = "default_web_max_tokens")]
    pub web_max_tokens: usize,

    #[serde(default = "default_max_tokens")]
    pub video_max_tokens: usize,

    #[serde(default = "default_max_tokens")]
    pub encyclopedia_max_tokens: usize,

    #[serde(default = "default_max_tokens")]
    pub academic_max_tokens: usize,
}

fn default_max_loops() -> u32 {
    3
}

fn default_recall_top_k() -> usize {
    5
}

fn default_source_timeout() -> u64 {
    30
}

fn default_transcript_timeout() -> u64 {
    10
}

fn default_web_max_results() -> usize {
    1
}

fn default_max_results() -> usize {
    3
}

fn default_web_max_tokens() -> usize {
    1000
}

fn default_max_tokens() -> usize {
    500
}

impl Default for ResearchSettings {
    fn default() -> Self {
        Self {
            max_loops: default_max_loops(),
            recall_top_k: default_recall_top_k(),
            source_timeout_secs: default_source_timeout(),
            transcript_timeout_secs: default_transcript_timeout(),
            web_max_results: default_web_max_results(),
            video_max_results: default_max_results(),
            encyclopedia_max_results: default_max_results(),
            academic_max_results: default_max_results(),
            web_max_tokens: default_web_max_tokens(),
            video_max_tokens: default_max_tokens(),
            encyclopedia_max_tokens: default_max_tokens(),
            academic_max_tokens: default_max_tokens(),
        }
    }
}

impl ResearchSettings {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_secs(self.source_timeout_secs)
    }

    pub fn transcript_timeout(&self) -> Duration {
        Duration::from_secs(self.transcript_timeout_secs)
    }

    /// Result count and token budget for one source kind.
    pub fn connector_settings(&self, kind: SourceKind) -> ConnectorSettings {
        let (max_results, max_tokens) = match kind {
            SourceKind::Web => (self.web_max_results, self.web_max_tokens),
            SourceKind::Video => (self.video_max_results, self.video_max_tokens),
            SourceKind::Encyclopedia => (self.encyclopedia_max_results, self.encyclopedia_max_tokens),
            SourceKind::Academic => (self.academic_max_results, self.academic_max_tokens),
        };
        ConnectorSettings::new(max_results, max_tokens, self.source_timeout())
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_loops: self.max_loops,
            recall_top_k: self.recall_top_k,
            source_timeout: self.source_timeout(),
        }
    }
}

// ============= Video =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YouTubeConfig {
    #[serde(default = "default_youtube_key_env")]
    pub api_key_env: String,
}

fn default_youtube_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_youtube_key_env(),
        }
    }
}

// ============= Notifications =============

/// Both channels are attempted on every run. A channel left unconfigured
/// fails at send time and is recorded as a failed notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub email: EmailConfig,

    #[serde(default)]
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub recipient: String,

    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default = "default_smtp_username_env")]
    pub username_env: String,

    #[serde(default = "default_smtp_password_env")]
    pub password_env: String,

    /// Sender address; defaults to the SMTP username
    #[serde(default)]
    pub from: Option<String>,

    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_smtp_username_env() -> String {
    "SMTP_USERNAME".to_string()
}

fn default_smtp_password_env() -> String {
    "SMTP_PASSWORD".to_string()
}

fn default_smtp_timeout() -> u64 {
    30
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            username_env: default_smtp_username_env(),
            password_env: default_smtp_password_env(),
            from: None,
            timeout_secs: default_smtp_timeout(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscordConfig {
    #[serde(default = "default_discord_url_env")]
    pub webhook_url_env: String,

    #[serde(default = "default_discord_message")]
    pub message: String,

    #[serde(default = "default_discord_timeout")]
    pub timeout_secs: u64,
}

fn default_discord_url_env() -> String {
    "DISCORD_WEBHOOK_URL".to_string()
}

fn default_discord_message() -> String {
    crate::notify::discord::DEFAULT_MESSAGE.to_string()
}

fn default_discord_timeout() -> u64 {
    10
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url_env: default_discord_url_env(),
            message: default_discord_message(),
            timeout_secs: default_discord_timeout(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    /// A `*_env` key names a variable that is not set
    MissingEnvVar,
    /// A setting the run needs is empty; that step fails when it runs
    MissingSetting,
    /// A section is present but the feature it needs is compiled out
    FeatureDisabled,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl ResearchConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ResearchConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural consistency. Environment variables are not checked
    /// here; see [`Self::validate_with_warnings`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "llm.model must not be empty".into(),
            ));
        }

        if self.llm.temperature != 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "llm.temperature is {}, research runs require 0.0",
                self.llm.temperature
            )));
        }

        if self.research.max_loops > MAX_LOOPS_LIMIT {
            return Err(ConfigError::ValidationError(format!(
                "research.max_loops is {}, the limit is {}",
                self.research.max_loops, MAX_LOOPS_LIMIT
            )));
        }

        if self.research.source_timeout_secs == 0 || self.research.transcript_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "research timeouts must be at least one second".into(),
            ));
        }

        for kind in SourceKind::ALL {
            let settings = self.research.connector_settings(kind);
            if settings.max_results == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "research.{}_max_results must be at least 1",
                    kind
                )));
            }
            if !(1..=MAX_TOKENS_LIMIT).contains(&settings.max_tokens_per_source) {
                return Err(ConfigError::ValidationError(format!(
                    "research.{}_max_tokens is {}, it must be between 1 and {}",
                    kind, settings.max_tokens_per_source, MAX_TOKENS_LIMIT
                )));
            }
        }

        if let MemoryStoreProvider::Pinecone { index_host, .. } = &self.memory {
            if index_host.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "memory.index_host is required for the pinecone provider".into(),
                ));
            }
        }

        Ok(())
    }

    /// Validate, then collect warnings for unset environment variables and
    /// sections whose feature is compiled out
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings: Vec<ConfigWarning> = self
            .referenced_env_vars()
            .into_iter()
            .filter(|(_, var)| std::env::var(var).is_err())
            .map(|(purpose, var)| ConfigWarning {
                kind: ConfigWarningKind::MissingEnvVar,
                message: format!(
                    "Environment variable '{}' ({}) is not set; that step will fail when it runs",
                    var, purpose
                ),
            })
            .collect();

        if self.notify.email.recipient.trim().is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::MissingSetting,
                message: "notify.email.recipient is not set; email delivery will fail".into(),
            });
        } else if cfg!(not(feature = "email")) {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::FeatureDisabled,
                message: "[notify.email] is configured but the 'email' feature is disabled".into(),
            });
        }

        Ok(warnings)
    }

    /// `(purpose, variable)` for every environment variable the config
    /// refers to
    pub fn referenced_env_vars(&self) -> Vec<(&'static str, String)> {
        let mut vars = Vec::new();

        if let Some(var) = self.search.api_key_env() {
            vars.push(("web search key", var.to_string()));
        }
        vars.push(("YouTube key", self.youtube.api_key_env.clone()));
        if let MemoryStoreProvider::Pinecone { api_key_env, .. } = &self.memory {
            vars.push(("Pinecone key", api_key_env.clone()));
        }
        let email = &self.notify.email;
        if !email.recipient.trim().is_empty() {
            vars.push(("SMTP username", email.username_env.clone()));
            vars.push(("SMTP password", email.password_env.clone()));
        }
        vars.push(("chat webhook URL", self.notify.discord.webhook_url_env.clone()));

        vars
    }
}
