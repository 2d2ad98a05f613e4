//! Web search connectors.
//!
//! The backend is chosen once, when [`WebBackendConfig::build`] turns the
//! `[search]` section into a connector.

use super::{check_status, http_client, require_key, ConnectorSettings, SourceConnector};
use crate::types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

const TAVILY_URL: &str = "https://api.tavily.com";
const PERPLEXITY_URL: &str = "https://api.perplexity.ai";
const PERPLEXITY_FALLBACK_CITATION: &str = "https://perplexity.ai";
const PERPLEXITY_SYSTEM: &str = "Search the web and provide factual information with sources.";

/// `[search]` configuration: which web backend to use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum WebBackendConfig {
    /// Tavily search API, returns page content alongside snippets.
    Tavily {
        #[serde(default = "default_tavily_key_env")]
        api_key_env: String,
    },
    /// Perplexity chat completions; citations become results.
    Perplexity {
        #[serde(default = "default_perplexity_key_env")]
        api_key_env: String,
        #[serde(default = "default_perplexity_model")]
        model: String,
    },
    /// Keyless DuckDuckGo search.
    #[cfg(feature = "duckduckgo")]
    DuckDuckGo,
}

fn default_tavily_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}

fn default_perplexity_key_env() -> String {
    "PERPLEXITY_API_KEY".to_string()
}

fn default_perplexity_model() -> String {
    "sonar-pro".to_string()
}

impl Default for WebBackendConfig {
    fn default() -> Self {
        WebBackendConfig::Tavily {
            api_key_env: default_tavily_key_env(),
        }
    }
}

impl WebBackendConfig {
    pub fn name(&self) -> &'static str {
        match self {
            WebBackendConfig::Tavily { .. } => "tavily",
            WebBackendConfig::Perplexity { .. } => "perplexity",
            #[cfg(feature = "duckduckgo")]
            WebBackendConfig::DuckDuckGo => "duckduckgo",
        }
    }

    /// Environment variable the backend reads its key from, if any.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            WebBackendConfig::Tavily { api_key_env } => Some(api_key_env),
            WebBackendConfig::Perplexity { api_key_env, .. } => Some(api_key_env),
            #[cfg(feature = "duckduckgo")]
            WebBackendConfig::DuckDuckGo => None,
        }
    }

    /// Build the connector, resolving its key from the environment.
    ///
    /// A missing key is not an error here; the connector reports it on its
    /// first fetch.
    pub fn build(&self, settings: ConnectorSettings) -> Result<Arc<dyn SourceConnector>> {
        let key = self.api_key_env().and_then(|var| std::env::var(var).ok());
        let connector: Arc<dyn SourceConnector> = match self {
            WebBackendConfig::Tavily { api_key_env } => {
                Arc::new(TavilySearch::new(key, api_key_env.clone(), settings)?)
            }
            WebBackendConfig::Perplexity { api_key_env, model } => Arc::new(
                PerplexitySearch::new(key, api_key_env.clone(), settings)?.with_model(model.clone()),
            ),
            #[cfg(feature = "duckduckgo")]
            WebBackendConfig::DuckDuckGo => Arc::new(DuckDuckGoSearch::new(settings)),
        };
        Ok(connector)
    }
}

// ============= Tavily =============

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    settings: ConnectorSettings,
}

impl TavilySearch {
    pub fn new(
        api_key: Option<String>,
        api_key_env: impl Into<String>,
        settings: ConnectorSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(SourceKind::Web, settings.timeout)?,
            api_key,
            api_key_env: api_key_env.into(),
            base_url: TAVILY_URL.to_string(),
            settings,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SourceConnector for TavilySearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        let api_key = require_key(self.api_key.as_deref(), SourceKind::Web, &self.api_key_env)?;

        let response = self
            .client
            .post(format!("{}/search", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .json(&json!({
                "query": query,
                "max_results": self.settings.max_results,
                "include_raw_content": true,
            }))
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Web, e))?;

        let response = check_status(SourceKind::Web, response).await?;
        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Web, format!("Invalid Tavily reply: {}", e)))
    }
}

// ============= Perplexity =============

pub struct PerplexitySearch {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    model: String,
    settings: ConnectorSettings,
}

#[derive(Debug, Deserialize)]
struct PerplexityReply {
    choices: Vec<PerplexityChoice>,
    #[serde(default)]
    citations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    message: PerplexityMessage,
}

#[derive(Debug, Deserialize)]
struct PerplexityMessage {
    content: String,
}

impl PerplexitySearch {
    pub fn new(
        api_key: Option<String>,
        api_key_env: impl Into<String>,
        settings: ConnectorSettings,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(SourceKind::Web, settings.timeout)?,
            api_key,
            api_key_env: api_key_env.into(),
            base_url: PERPLEXITY_URL.to_string(),
            model: default_perplexity_model(),
            settings,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

/// Turn one Perplexity answer into results: the first citation carries the
/// answer, later citations are references only.
fn citations_to_results(content: String, citations: Vec<String>, loop_count: u32) -> Vec<SourceResult> {
    let citations = if citations.is_empty() {
        vec![PERPLEXITY_FALLBACK_CITATION.to_string()]
    } else {
        citations
    };
    let search_no = loop_count + 1;

    citations
        .into_iter()
        .enumerate()
        .map(|(i, url)| {
            let title = format!("Perplexity Search {}, Source {}", search_no, i + 1);
            if i == 0 {
                SourceResult::new(title, url, content.clone()).with_full_content(content.clone())
            } else {
                SourceResult::new(title, url, "See above for full content")
            }
        })
        .collect()
}

#[async_trait]
impl SourceConnector for PerplexitySearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn include_full_content(&self) -> bool {
        false
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, loop_count: u32) -> Result<SearchResponse> {
        let api_key = require_key(self.api_key.as_deref(), SourceKind::Web, &self.api_key_env)?;

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .bearer_auth(api_key)
            .header("accept", "application/json")
            .json(&json!({
                "model": self.model,
                "messages": [
                    {"role": "system", "content": PERPLEXITY_SYSTEM},
                    {"role": "user", "content": query}
                ]
            }))
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Web, e))?;

        let response = check_status(SourceKind::Web, response).await?;
        let reply: PerplexityReply = response.json().await.map_err(|e| {
            AppError::source_unavailable(SourceKind::Web, format!("Invalid Perplexity reply: {}", e))
        })?;

        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                AppError::source_unavailable(SourceKind::Web, "Perplexity reply has no choices")
            })?;

        Ok(citations_to_results(content, reply.citations.unwrap_or_default(), loop_count).into())
    }
}

// ============= DuckDuckGo =============

#[cfg(feature = "duckduckgo")]
pub struct DuckDuckGoSearch {
    settings: ConnectorSettings,
}

#[cfg(feature = "duckduckgo")]
impl DuckDuckGoSearch {
    pub fn new(settings: ConnectorSettings) -> Self {
        Self { settings }
    }
}

#[cfg(feature = "duckduckgo")]
#[async_trait]
impl SourceConnector for DuckDuckGoSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Web
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: self.settings.max_results,
                ..Default::default()
            }),
        };

        let search = daedra::tools::search::perform_search(&search_args);
        let response = tokio::time::timeout(self.settings.timeout, search)
            .await
            .map_err(|_| AppError::source_unavailable(SourceKind::Web, "DuckDuckGo search timed out"))?
            .map_err(|e| AppError::source_unavailable(SourceKind::Web, e))?;

        Ok(response
            .data
            .into_iter()
            .map(|r| SourceResult::new(r.title, r.url, r.description))
            .collect::<Vec<_>>()
            .into())
    }
}
