//! Source Connectors
//!
//! One adapter per kind of information source. Every connector normalizes
//! its backend's reply into a [`SearchResponse`] and reports failures with
//! the error kinds the orchestrator understands:
//!
//! - missing credential: [`AppError::Configuration`], raised at the call
//! - transport failure, bad status, undecodable body:
//!   [`AppError::SourceUnavailable`]
//!
//! # Connectors
//!
//! | Kind | Connector | Backend |
//! |---|---|---|
//! | web | [`web::TavilySearch`], [`web::PerplexitySearch`], `web::DuckDuckGoSearch` | selected by `[search] backend` |
//! | video | [`video::YouTubeSearch`] | YouTube Data API v3 + timed-text transcripts |
//! | encyclopedia | [`encyclopedia::WikipediaSearch`] | MediaWiki extracts API |
//! | academic | [`academic::ArxivSearch`] | arXiv Atom API |

pub mod academic;
pub mod encyclopedia;
pub mod video;
pub mod web;

use crate::types::{AppError, Result, SearchResponse, SourceKind};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Uniform fetch-and-normalize adapter over one data source.
#[async_trait]
pub trait SourceConnector: Send + Sync {
    /// The kind of source this connector serves.
    fn kind(&self) -> SourceKind;

    /// Fetch results for `query`.
    ///
    /// `loop_count` is the index of the current research cycle; some
    /// backends use it to label their results.
    async fn fetch(&self, query: &str, loop_count: u32) -> Result<SearchResponse>;

    /// Whether aggregation should include each result's full content.
    fn include_full_content(&self) -> bool {
        true
    }

    /// Token budget per source used when aggregating this connector's results.
    fn max_tokens_per_source(&self) -> usize;
}

/// Limits shared by every connector of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectorSettings {
    pub max_results: usize,
    pub max_tokens_per_source: usize,
    pub timeout: Duration,
}

impl ConnectorSettings {
    pub fn new(max_results: usize, max_tokens_per_source: usize, timeout: Duration) -> Self {
        Self {
            max_results,
            max_tokens_per_source,
            timeout,
        }
    }
}

impl Default for ConnectorSettings {
    fn default() -> Self {
        Self::new(3, 500, Duration::from_secs(30))
    }
}

/// One connector per source kind, in the order a cycle fetches them.
#[derive(Clone)]
pub struct SourceSet {
    pub web: Arc<dyn SourceConnector>,
    pub video: Arc<dyn SourceConnector>,
    pub encyclopedia: Arc<dyn SourceConnector>,
    pub academic: Arc<dyn SourceConnector>,
}

impl SourceSet {
    pub fn new(
        web: Arc<dyn SourceConnector>,
        video: Arc<dyn SourceConnector>,
        encyclopedia: Arc<dyn SourceConnector>,
        academic: Arc<dyn SourceConnector>,
    ) -> Self {
        Self {
            web,
            video,
            encyclopedia,
            academic,
        }
    }

    pub fn get(&self, kind: SourceKind) -> &Arc<dyn SourceConnector> {
        match kind {
            SourceKind::Web => &self.web,
            SourceKind::Video => &self.video,
            SourceKind::Encyclopedia => &self.encyclopedia,
            SourceKind::Academic => &self.academic,
        }
    }
}

/// HTTP client shared by the connectors' constructors.
pub(crate) fn http_client(kind: SourceKind, timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("deep-research/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::source_unavailable(kind, format!("HTTP client: {}", e)))
}

/// Turn a non-2xx reply into `SourceUnavailable`, passing success through.
pub(crate) async fn check_status(
    kind: SourceKind,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(200).collect();
    Err(AppError::source_unavailable(
        kind,
        format!("HTTP {}: {}", status, body),
    ))
}

/// Resolve a required credential, failing with `Configuration` when absent.
pub(crate) fn require_key<'a>(key: Option<&'a str>, kind: SourceKind, env_var: &str) -> Result<&'a str> {
    key.filter(|k| !k.trim().is_empty()).ok_or_else(|| {
        AppError::Configuration(format!(
            "{} source requires an API key in environment variable '{}'",
            kind, env_var
        ))
    })
}
