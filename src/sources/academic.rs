//! Academic connector backed by the arXiv Atom API.
//!
//! The feed is small and regular, so entries are pulled out with plain
//! string scanning rather than a full XML parser.

use super::{check_status, http_client, ConnectorSettings, SourceConnector};
use crate::types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
use async_trait::async_trait;

const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

pub struct ArxivSearch {
    client: reqwest::Client,
    api_url: String,
    settings: ConnectorSettings,
}

/// One `<entry>` of an arXiv feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ArxivEntry {
    pub title: String,
    pub summary: String,
    pub link: String,
}

impl ArxivSearch {
    pub fn new(settings: ConnectorSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(SourceKind::Academic, settings.timeout)?,
            api_url: ARXIV_API_URL.to_string(),
            settings,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn request_url(&self, query: &str) -> String {
        format!(
            "{}?search_query=all:{}&start=0&max_results={}",
            self.api_url,
            urlencoding::encode(query),
            self.settings.max_results
        )
    }
}

#[async_trait]
impl SourceConnector for ArxivSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Academic
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        let response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Academic, e))?;

        let response = check_status(SourceKind::Academic, response).await?;
        let feed = response
            .text()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Academic, e))?;

        Ok(parse_feed(&feed)
            .into_iter()
            .map(|entry| {
                SourceResult::new(entry.title, entry.link, entry.summary.clone())
                    .with_full_content(entry.summary)
            })
            .collect::<Vec<_>>()
            .into())
    }
}

/// Parse every well-formed entry of an Atom feed. Entries without a title
/// are skipped.
pub fn parse_feed(xml: &str) -> Vec<ArxivEntry> {
    extract_entries(xml)
        .into_iter()
        .filter_map(parse_entry)
        .collect()
}

fn parse_entry(entry: &str) -> Option<ArxivEntry> {
    let title = normalize_whitespace(&decode_entities(&extract_tag_text(entry, "title")?));
    let summary = extract_tag_text(entry, "summary")
        .map(|s| normalize_whitespace(&decode_entities(&s)))
        .unwrap_or_default();
    let link = alternate_link(entry)
        .or_else(|| extract_tag_text(entry, "id"))
        .unwrap_or_default();

    Some(ArxivEntry {
        title,
        summary,
        link,
    })
}

fn extract_entries(xml: &str) -> Vec<&str> {
    const OPEN: &str = "<entry>";
    const CLOSE: &str = "</entry>";

    let mut entries = Vec::new();
    let mut rest = xml;
    while let Some(start) = rest.find(OPEN) {
        let Some(len) = rest[start..].find(CLOSE) else {
            break;
        };
        let end = start + len + CLOSE.len();
        entries.push(&rest[start..end]);
        rest = &rest[end..];
    }
    entries
}

/// Text between `<tag ...>` and `</tag>`, trimmed. Does not match tags that
/// merely share a prefix (`<link` vs `<linkage`).
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);

    let mut search_from = 0;
    loop {
        let start = xml[search_from..].find(&open)? + search_from;
        let after = xml[start + open.len()..].chars().next()?;
        if after == '>' || after.is_whitespace() {
            let content_start = xml[start..].find('>')? + start + 1;
            let content_end = xml[content_start..].find(&close)? + content_start;
            return Some(xml[content_start..content_end].trim().to_string());
        }
        search_from = start + open.len();
    }
}

fn extract_attribute(tag: &str, attr: &str) -> Option<String> {
    let search = format!(" {}=\"", attr);
    let start = tag.find(&search)? + search.len();
    let end = tag[start..].find('"')? + start;
    Some(tag[start..end].to_string())
}

/// `href` of the entry's `rel="alternate"` link, the abstract page.
fn alternate_link(entry: &str) -> Option<String> {
    entry
        .match_indices("<link")
        .filter_map(|(pos, _)| {
            let end = entry[pos..].find('>')? + pos;
            Some(&entry[pos..=end])
        })
        .find(|tag| extract_attribute(tag, "rel").as_deref() == Some("alternate"))
        .and_then(|tag| extract_attribute(tag, "href"))
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
