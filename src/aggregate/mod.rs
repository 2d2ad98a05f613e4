//! Source Aggregator
//!
//! Turns heterogeneous connector responses into the bounded-length text
//! blocks fed to the summarizer, and into bibliography entries.
//!
//! Both functions are pure: no I/O, and the output depends only on the input
//! order.
//!
//! # Block format
//!
//! ```text
//! Sources:
//!
//! Source {title}:
//! ===
//! URL: {url}
//! ===
//! Most relevant content from source: {snippet}
//! ===
//! Full source content limited to {N} tokens: {full content}
//! ```
//!
//! The last line is emitted only when full content is requested.

use crate::types::{CitationEntry, SearchResponse, SourceResult};
use std::collections::HashSet;

/// Characters per token used to turn a token budget into a character limit.
pub const CHARS_PER_TOKEN: usize = 4;

/// Appended to full content clipped at the character limit.
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Rendered in place of full content a source did not provide.
pub const UNAVAILABLE_MARKER: &str = "[full content unavailable]";

/// Connector output accepted by [`aggregate`]: a single bundle or several.
#[derive(Debug, Clone)]
pub enum RawResults {
    Single(SearchResponse),
    Many(Vec<SearchResponse>),
}

impl RawResults {
    /// Flatten to one sequence of results, preserving bundle order.
    pub fn into_results(self) -> Vec<SourceResult> {
        match self {
            RawResults::Single(response) => response.results,
            RawResults::Many(responses) => responses
                .into_iter()
                .flat_map(|response| response.results)
                .collect(),
        }
    }
}

impl From<SearchResponse> for RawResults {
    fn from(response: SearchResponse) -> Self {
        RawResults::Single(response)
    }
}

impl From<Vec<SearchResponse>> for RawResults {
    fn from(responses: Vec<SearchResponse>) -> Self {
        RawResults::Many(responses)
    }
}

impl From<Vec<SourceResult>> for RawResults {
    fn from(results: Vec<SourceResult>) -> Self {
        RawResults::Single(SearchResponse::new(results))
    }
}

/// Deduplicate results by URL (first occurrence wins) and format them.
pub fn aggregate(
    raw: impl Into<RawResults>,
    max_tokens_per_source: usize,
    include_full_content: bool,
) -> String {
    let results = raw.into().into_results();
    let mut seen = HashSet::new();
    let char_limit = max_tokens_per_source.saturating_mul(CHARS_PER_TOKEN);

    let mut formatted = String::from("Sources:\n\n");
    for source in results.iter().filter(|r| seen.insert(r.url.as_str())) {
        formatted.push_str(&format!("Source {}:\n===\n", source.title));
        formatted.push_str(&format!("URL: {}\n===\n", source.url));
        formatted.push_str(&format!(
            "Most relevant content from source: {}\n===\n",
            source.snippet
        ));

        if include_full_content {
            let body = match source.full_content.as_deref() {
                Some(content) => truncate_chars(content, char_limit),
                None => {
                    tracing::debug!(url = %source.url, "source has no full content");
                    UNAVAILABLE_MARKER.to_string()
                }
            };
            formatted.push_str(&format!(
                "Full source content limited to {} tokens: {}\n\n",
                max_tokens_per_source, body
            ));
        }
    }

    formatted.trim().to_string()
}

/// One bibliography entry per original result, in source order.
///
/// Not deduplicated.
pub fn citation_list(results: &[SourceResult]) -> Vec<CitationEntry> {
    results
        .iter()
        .map(|r| CitationEntry {
            title: r.title.clone(),
            url: r.url.clone(),
        })
        .collect()
}

/// Clip `text` to `limit` characters, appending [`TRUNCATION_MARKER`] when
/// anything was removed.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_offset, _)) => format!("{}{}", &text[..byte_offset], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, full: Option<&str>) -> SourceResult {
        SourceResult {
            title: title.to_string(),
            url: url.to_string(),
            snippet: format!("snippet of {}", title),
            full_content: full.map(String::from),
        }
    }

    #[test]
    fn test_format_single_source() {
        let response = SearchResponse::new(vec![result("Rust", "https://rust-lang.org", Some("body"))]);
        let text = aggregate(response, 10, true);

        assert_eq!(
            text,
            "Sources:\n\n\
             Source Rust:\n===\n\
             URL: https://rust-lang.org\n===\n\
             Most relevant content from source: snippet of Rust\n===\n\
             Full source content limited to 10 tokens: body"
        );
    }

    #[test]
    fn test_without_full_content_omits_body_line() {
        let response = SearchResponse::new(vec![result("A", "https://a", Some("body"))]);
        let text = aggregate(response, 10, false);
        assert!(!text.contains("Full source content"));
        assert!(text.ends_with("Most relevant content from source: snippet of A\n==="));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let results = vec![
            result("First", "https://same", Some("one")),
            result("Other", "https://other", Some("two")),
            result("Second", "https://same", Some("three")),
        ];
        let text = aggregate(results, 100, true);

        assert!(text.contains("Source First:"));
        assert!(!text.contains("Source Second:"));
        assert!(text.find("Source First:").unwrap() < text.find("Source Other:").unwrap());
    }

    #[test]
    fn test_dedup_idempotence() {
        let results = vec![
            result("A", "https://a", Some("alpha")),
            result("B", "https://b", None),
        ];
        let once = aggregate(results.clone(), 50, true);
        let doubled: Vec<_> = results.iter().chain(results.iter()).cloned().collect();
        let twice = aggregate(doubled, 50, true);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_many_bundles_are_flattened_in_order() {
        let bundles = vec![
            SearchResponse::new(vec![result("A", "https://a", None)]),
            SearchResponse::new(vec![result("B", "https://b", None)]),
        ];
        let text = aggregate(bundles, 5, false);
        assert!(text.find("Source A:").unwrap() < text.find("Source B:").unwrap());
    }

    #[test]
    fn test_oversized_budget_keeps_whole_body() {
        let text = aggregate(vec![result("Big", "https://big", Some("full body"))], usize::MAX, true);
        assert!(text.ends_with(&format!("limited to {} tokens: full body", usize::MAX)));
    }

    #[test]
    fn test_truncation_law() {
        let n = 3;
        let limit = n * CHARS_PER_TOKEN;

        let long = "x".repeat(limit + 5);
        let text = aggregate(vec![result("L", "https://l", Some(&long))], n, true);
        let expected = format!("{}{}", "x".repeat(limit), TRUNCATION_MARKER);
        assert!(text.ends_with(&expected));

        let exact = "y".repeat(limit);
        let text = aggregate(vec![result("E", "https://e", Some(&exact))], n, true);
        assert!(text.ends_with(&format!("tokens: {}", exact)));
        assert!(!text.contains(TRUNCATION_MARKER));
    }

    #[test]
    fn test_truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("héllo", 2), format!("hé{}", TRUNCATION_MARKER));
        assert_eq!(truncate_chars("héllo", 5), "héllo");
    }

    #[test]
    fn test_missing_full_content_renders_placeholder_not_empty() {
        let missing = aggregate(vec![result("M", "https://m", None)], 10, true);
        assert!(missing.ends_with(UNAVAILABLE_MARKER));

        let empty = aggregate(vec![result("E", "https://e", Some(""))], 10, true);
        assert!(!empty.contains(UNAVAILABLE_MARKER));
        assert!(empty.ends_with("limited to 10 tokens:"));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(SearchResponse::default(), 10, true), "Sources:");
    }

    #[test]
    fn test_citation_list_is_not_deduplicated() {
        let results = vec![
            result("A", "https://same", None),
            result("B", "https://same", None),
        ];
        let citations = citation_list(&results);
        assert_eq!(citations.len(), 2);
        assert_eq!(citations[0].title, "A");
        assert_eq!(citations[1].title, "B");
    }
}
