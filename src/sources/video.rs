//! Video connector: YouTube search plus transcripts.
//!
//! Transcripts are fetched concurrently, each under its own timeout. A
//! transcript that times out or fails does not fail the fetch; the result
//! carries a placeholder text instead.

use super::{check_status, http_client, require_key, ConnectorSettings, SourceConnector};
use crate::types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
use async_trait::async_trait;
use futures::future::join_all;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::time::Duration;

const YOUTUBE_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const TRANSCRIPT_URL: &str = "https://www.youtube.com";

pub const TRANSCRIPT_TIMED_OUT: &str = "Transcript retrieval timed out.";
pub const TRANSCRIPT_UNAVAILABLE: &str = "Transcript not available.";

/// Transcript characters kept in a result's snippet.
const SNIPPET_CHARS: usize = 200;

pub struct YouTubeSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    api_key_env: String,
    api_url: String,
    transcript_url: String,
    transcript_timeout: Duration,
    settings: ConnectorSettings,
}

#[derive(Debug, Deserialize)]
struct SearchListReply {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: ItemSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemSnippet {
    title: String,
}

impl YouTubeSearch {
    pub fn new(
        api_key: Option<String>,
        api_key_env: impl Into<String>,
        settings: ConnectorSettings,
        transcript_timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client(SourceKind::Video, settings.timeout)?,
            api_key,
            api_key_env: api_key_env.into(),
            api_url: YOUTUBE_API_URL.to_string(),
            transcript_url: TRANSCRIPT_URL.to_string(),
            transcript_timeout,
            settings,
        })
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_transcript_url(mut self, url: impl Into<String>) -> Self {
        self.transcript_url = url.into();
        self
    }

    async fn search(&self, api_key: &str, query: &str) -> Result<Vec<(String, String)>> {
        let max_results = self.settings.max_results.to_string();
        let response = self
            .client
            .get(format!("{}/search", self.api_url.trim_end_matches('/')))
            .query(&[
                ("part", "snippet"),
                ("q", query),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Video, e))?;

        let response = check_status(SourceKind::Video, response).await?;
        let reply: SearchListReply = response.json().await.map_err(|e| {
            AppError::source_unavailable(SourceKind::Video, format!("Invalid YouTube reply: {}", e))
        })?;

        Ok(reply
            .items
            .into_iter()
            .filter_map(|item| Some((item.id.video_id?, item.snippet.title)))
            .collect())
    }

    async fn fetch_transcript(&self, video_id: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/api/timedtext", self.transcript_url.trim_end_matches('/')))
            .query(&[("lang", "en"), ("v", video_id)])
            .send()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Video, e))?;
        let response = check_status(SourceKind::Video, response).await?;
        let body = response
            .text()
            .await
            .map_err(|e| AppError::source_unavailable(SourceKind::Video, e))?;

        parse_transcript(&body)
    }

    /// Transcript text, or a placeholder when it cannot be had in time.
    async fn transcript_or_placeholder(&self, video_id: &str) -> String {
        match tokio::time::timeout(self.transcript_timeout, self.fetch_transcript(video_id)).await {
            Ok(Ok(transcript)) => transcript,
            Ok(Err(e)) => {
                tracing::debug!(video_id, error = %e, "Transcript unavailable");
                TRANSCRIPT_UNAVAILABLE.to_string()
            }
            Err(_) => {
                tracing::warn!(video_id, timeout_secs = self.transcript_timeout.as_secs(), "Transcript retrieval timed out");
                TRANSCRIPT_TIMED_OUT.to_string()
            }
        }
    }
}

/// Join the `<text>` segments of a timed-text document.
pub fn parse_transcript(xml: &str) -> Result<String> {
    let selector = Selector::parse("text")
        .map_err(|e| AppError::Internal(format!("Invalid transcript selector: {}", e)))?;
    let document = Html::parse_fragment(xml);

    let segments: Vec<String> = document
        .select(&selector)
        .map(|segment| segment.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if segments.is_empty() {
        return Err(AppError::source_unavailable(
            SourceKind::Video,
            "transcript has no segments",
        ));
    }
    Ok(segments.join(" "))
}

/// First [`SNIPPET_CHARS`] characters, with `...` when anything was cut.
fn transcript_snippet(transcript: &str) -> String {
    if transcript.chars().count() > SNIPPET_CHARS {
        format!("{}...", transcript.chars().take(SNIPPET_CHARS).collect::<String>())
    } else {
        transcript.to_string()
    }
}

#[async_trait]
impl SourceConnector for YouTubeSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::Video
    }

    fn max_tokens_per_source(&self) -> usize {
        self.settings.max_tokens_per_source
    }

    async fn fetch(&self, query: &str, _loop_count: u32) -> Result<SearchResponse> {
        let api_key = require_key(self.api_key.as_deref(), SourceKind::Video, &self.api_key_env)?;
        let videos = self.search(api_key, query).await?;

        let transcripts = join_all(
            videos
                .iter()
                .map(|(video_id, _)| self.transcript_or_placeholder(video_id)),
        )
        .await;

        Ok(videos
            .into_iter()
            .zip(transcripts)
            .map(|((video_id, title), transcript)| {
                let url = format!("https://www.youtube.com/watch?v={}", video_id);
                SourceResult::new(title, url, transcript_snippet(&transcript))
                    .with_full_content(transcript)
            })
            .collect::<Vec<_>>()
            .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transcript_decodes_entities() {
        let xml = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0" dur="1.5">Hello &amp; welcome</text><text start="1.5" dur="2">to qubits</text></transcript>"#;
        assert_eq!(parse_transcript(xml).unwrap(), "Hello & welcome to qubits");
    }

    #[test]
    fn test_parse_empty_transcript_fails() {
        assert!(parse_transcript("").is_err());
        assert!(parse_transcript("<transcript></transcript>").is_err());
    }

    #[test]
    fn test_snippet_truncation() {
        let short = "short transcript";
        assert_eq!(transcript_snippet(short), short);

        let long = "a".repeat(250);
        let snippet = transcript_snippet(&long);
        assert_eq!(snippet, format!("{}...", "a".repeat(200)));
    }

    #[test]
    fn test_search_reply_skips_items_without_video_id() {
        let reply: SearchListReply = serde_json::from_value(serde_json::json!({
            "items": [
                {"id": {"kind": "youtube#video", "videoId": "abc"}, "snippet": {"title": "Intro"}},
                {"id": {"kind": "youtube#channel"}, "snippet": {"title": "Channel"}}
            ]
        }))
        .unwrap();
        let ids: Vec<_> = reply.items.into_iter().filter_map(|i| i.id.video_id).collect();
        assert_eq!(ids, vec!["abc"]);
    }
}
