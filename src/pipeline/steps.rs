//! Reasoning steps: query generation, summarization, reflection.

use super::prompts::{self, SummaryContext};
use crate::llm::{parse_json_reply, LLMClient};
use crate::types::{Result, SourceKind};
use serde::Deserialize;

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";

#[derive(Debug, Deserialize)]
struct QueryReply {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    aspect: Option<String>,
    #[serde(default)]
    rationale: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReflectionReply {
    #[serde(default)]
    knowledge_gap: Option<String>,
    #[serde(default)]
    follow_up_query: Option<String>,
}

/// Most recent block of each source kind, as read by [`summarize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestBlocks<'a> {
    pub web: Option<&'a str>,
    pub video: Option<&'a str>,
    pub encyclopedia: Option<&'a str>,
    pub academic: Option<&'a str>,
}

impl<'a> LatestBlocks<'a> {
    /// Collect the latest block per kind through `latest`.
    pub fn from_fn(latest: impl Fn(SourceKind) -> Option<&'a str>) -> Self {
        Self {
            web: latest(SourceKind::Web),
            video: latest(SourceKind::Video),
            encyclopedia: latest(SourceKind::Encyclopedia),
            academic: latest(SourceKind::Academic),
        }
    }
}

/// Deterministic follow-up used when reflection proposes nothing.
pub fn fallback_query(topic: &str) -> String {
    format!("Tell me more about {}", topic)
}

/// First search query of a run, derived from the topic alone.
///
/// A reply without a usable `query` falls back to the topic itself.
pub async fn generate_query(llm: &dyn LLMClient, topic: &str) -> Result<String> {
    let raw = llm
        .generate_json(
            &prompts::query_writer_instructions(topic),
            prompts::QUERY_WRITER_REQUEST,
        )
        .await?;
    let reply: QueryReply = parse_json_reply(&raw)?;

    match reply.query.filter(|q| !q.trim().is_empty()) {
        Some(query) => {
            tracing::debug!(
                query = %query,
                aspect = reply.aspect.as_deref().unwrap_or_default(),
                rationale = reply.rationale.as_deref().unwrap_or_default(),
                "Generated query"
            );
            Ok(query)
        }
        None => {
            tracing::warn!(topic, "Query reply had no query, searching for the topic");
            Ok(topic.to_string())
        }
    }
}

/// Fold the latest material into a new running summary.
pub async fn summarize(
    llm: &dyn LLMClient,
    prior_summary: &str,
    recalled_memory: &[String],
    latest: LatestBlocks<'_>,
    topic: &str,
) -> Result<String> {
    let context = SummaryContext {
        topic,
        memory: recalled_memory,
        existing_summary: prior_summary,
        encyclopedia: latest.encyclopedia.unwrap_or_default(),
        academic: latest.academic.unwrap_or_default(),
        web: latest.web.unwrap_or_default(),
        video: latest.video.unwrap_or_default(),
    };

    let raw = llm
        .generate_with_system(prompts::SUMMARIZER_INSTRUCTIONS, &context.render())
        .await?;

    Ok(strip_deliberation(&raw))
}

/// Propose the next query from the running summary.
///
/// An absent or blank `follow_up_query` yields [`fallback_query`]. Output
/// that is not JSON at all is `MalformedResponse`.
pub async fn reflect(llm: &dyn LLMClient, summary: &str, topic: &str) -> Result<String> {
    let raw = llm
        .generate_json(
            &prompts::reflection_instructions(topic),
            &prompts::reflection_request(summary),
        )
        .await?;
    let reply: ReflectionReply = parse_json_reply(&raw)?;

    match reply.follow_up_query.filter(|q| !q.trim().is_empty()) {
        Some(query) => {
            tracing::debug!(
                knowledge_gap = reply.knowledge_gap.as_deref().unwrap_or_default(),
                query = %query,
                "Reflection proposed follow-up"
            );
            Ok(query)
        }
        None => {
            tracing::warn!(topic, "Reflection proposed no follow-up, using fallback query");
            Ok(fallback_query(topic))
        }
    }
}

/// Remove balanced `<think>...</think>` spans in one pass, innermost first.
///
/// An opening marker without a close is kept as text, and so is a close with
/// no open. The result is trimmed.
pub fn strip_deliberation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut open_at: Vec<usize> = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(THINK_OPEN) {
            open_at.push(out.len());
            out.push_str(THINK_OPEN);
            rest = after;
        } else if let Some(after) = rest.strip_prefix(THINK_CLOSE) {
            match open_at.pop() {
                Some(start) => out.truncate(start),
                None => out.push_str(THINK_CLOSE),
            }
            rest = after;
        } else {
            let next = rest
                .char_indices()
                .skip(1)
                .find(|(_, c)| *c == '<')
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            out.push_str(&rest[..next]);
            rest = &rest[next..];
        }
    }

    out.trim().to_string()
}
