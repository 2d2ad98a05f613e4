use serde::{Deserialize, Serialize};
use std::fmt;

// ============= Source Types =============

/// The four kinds of information source queried in every research cycle.
///
/// The declaration order is the fetch order of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Web,
    Video,
    Encyclopedia,
    Academic,
}

impl SourceKind {
    /// All kinds in fetch order.
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Web,
        SourceKind::Video,
        SourceKind::Encyclopedia,
        SourceKind::Academic,
    ];

    /// Step name used for timings and logging.
    pub fn step_name(&self) -> &'static str {
        match self {
            SourceKind::Web => "web_research",
            SourceKind::Video => "video_research",
            SourceKind::Encyclopedia => "encyclopedia_research",
            SourceKind::Academic => "academic_research",
        }
    }

    /// Prefix of the memory record id written for this kind, e.g. `web_0`.
    pub fn memory_prefix(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::Video => "yt",
            SourceKind::Encyclopedia => "wiki",
            SourceKind::Academic => "arxiv",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Web => "web",
            SourceKind::Video => "video",
            SourceKind::Encyclopedia => "encyclopedia",
            SourceKind::Academic => "academic",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized result returned by a source connector.
///
/// Serializes to the uniform connector wire shape
/// `{title, url, content, raw_content}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceResult {
    pub title: String,
    pub url: String,
    #[serde(rename = "content")]
    pub snippet: String,
    /// Absent when the source truncated or could not provide the full text.
    /// Never conflated with an empty string.
    #[serde(rename = "raw_content", default)]
    pub full_content: Option<String>,
}

impl SourceResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
            full_content: None,
        }
    }

    pub fn with_full_content(mut self, content: impl Into<String>) -> Self {
        self.full_content = Some(content.into());
        self
    }
}

/// One response bundle from a connector: `{results: [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<SourceResult>,
}

impl SearchResponse {
    pub fn new(results: Vec<SourceResult>) -> Self {
        Self { results }
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl From<Vec<SourceResult>> for SearchResponse {
    fn from(results: Vec<SourceResult>) -> Self {
        Self { results }
    }
}

/// Bibliography entry accumulated across every source and cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationEntry {
    pub title: String,
    pub url: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Source unavailable ({source_kind}): {reason}")]
    SourceUnavailable {
        source_kind: SourceKind,
        reason: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Memory store error: {0}")]
    Memory(String),

    #[error("Notification via {channel} failed: {reason}")]
    Notification { channel: String, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn source_unavailable(source_kind: SourceKind, reason: impl fmt::Display) -> Self {
        AppError::SourceUnavailable {
            source_kind,
            reason: reason.to_string(),
        }
    }

    pub fn notification(channel: impl Into<String>, reason: impl fmt::Display) -> Self {
        AppError::Notification {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }

    /// Reason to record when the orchestrator contains this error at the
    /// connector boundary. `None` means the run must abort.
    pub fn degradation_reason(&self) -> Option<&str> {
        match self {
            AppError::SourceUnavailable { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_degradable(&self) -> bool {
        self.degradation_reason().is_some()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
