//! Encyclopedia connector backed by the Wikipedia extracts API.

use super::{check_status, http_client, ConnectorSettings, SourceConnector};
use crate::types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
use async_trait::async_trait;
use serde::Deserialize;

const WIKIPEDIA_API_URL: &str = "https://en.wikipedia.org/w/api.php";
const WIKIPEDIA_ARTICLE_URL: &str = "https://en.wikipedia.org/wiki";

pub struct WikipediaSearch {
    client: reqwest::Client,
    api_url: String,
    settings: ConnectorSettings,
}

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    query: Option<QueryBody>,
}

#[derive(Debug, Deserialize)]
struct QueryBody {
    #[serde(default)]
    pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    #[serde(default)]
    title: String,
    #[serde(default)]
    extract: Option<String>,
    #[serde(default)]
    missing: bool,
}

impl WikipediaSearch {
    pub fn new(settings: ConnectorSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(SourceKind::Encyclopedia, settings.timeout)?,
            api_url: WIKIPEDIA_API_URL.to_string(),
            settings,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }
}

/// Canonical article URL for a page title.
pub fn article_url(title: &str) -> String {
    format!("{}/{}", WIKIPEDIA_ARTICLE_URL, title.replace(' ', "_"))
}

#[async_trait]
impl SourceConnector for WikipediaSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Encyclopedia
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("action", "query"),
                ("format", "json"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("formatversion", "2"),
                ("titles", query),
            ])
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Encyclopedia, e))?;

        let response = check_status(SourceKind::Encyclopedia, response).await?;
        let reply: QueryReply = response.json().await.map_err(|e| {
            AppError::source_unavailable(
                SourceKind::Encyclopedia,
                format!("Invalid Wikipedia reply: {}", e),
            )
        })?;

        let pages = reply.query.map(|q| q.pages).unwrap_or_default();
        Ok(pages
            .into_iter()
            .filter(|page| !page.missing)
            .take(self.settings.max_results)
            .map(|page| {
                let extract = page.extract.unwrap_or_default();
                let url = article_url(&page.title);
                SourceResult::new(page.title, url, extract.clone()).with_full_content(extract)
            })
            .collect::<Vec<_>>()
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_url_replaces_spaces() {
        assert_eq!(
            article_url("Quantum computing"),
            "https://en.wikipedia.org/wiki/Quantum_computing"
        );
    }

    #[test]
    fn test_reply_parsing_marks_missing_pages() {
        let reply: QueryReply = serde_json::from_value(serde_json::json!({
            "batchcomplete": true,
            "query": {
                "pages": [
                    {"pageid": 1, "title": "Qubit", "extract": "A qubit is..."},
                    {"title": "Nonexistent page", "missing": true}
                ]
            }
        }))
        .unwrap();
        let pages = reply.query.unwrap().pages;
        assert!(!pages[0].missing);
        assert!(pages[1].missing);
        assert!(pages[1].extract.is_none());
    }

    #[test]
    fn test_reply_without_query_section() {
        let reply: QueryReply = serde_json::from_str("{}").unwrap();
        assert!(reply.query.is_none());
    }
}
