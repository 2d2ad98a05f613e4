//! Memory Recall and Upsert adapters.
//!
//! Both adapters sit over a [`MemoryStore`] and tag records with keywords
//! produced by [`extract_keywords`], so a recall for a query finds the blocks
//! written for a similar topic.

use crate::db::MemoryStore;
use crate::types::Result;
use std::collections::HashSet;
use std::sync::Arc;

/// Tokens dropped by [`extract_keywords`].
pub const STOPWORDS: &[&str] = &[
    "is", "the", "a", "an", "of", "to", "and", "for", "in", "on", "how", "what", "why", "that",
];

/// Tokens shorter than this are dropped.
pub const MIN_KEYWORD_LEN: usize = 3;

/// Split on non-word characters, lowercase, and drop stopwords and short
/// tokens. Duplicates are removed, first occurrence order kept.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .filter(|token| token.chars().count() >= MIN_KEYWORD_LEN)
        .filter(|token| !STOPWORDS.contains(&token.as_str()))
        .filter(|token| seen.insert(token.clone()))
        .collect()
}

/// Retrieves prior fragments relevant to the current query.
#[derive(Clone)]
pub struct MemoryRecall {
    store: Arc<dyn MemoryStore>,
}

impl MemoryRecall {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Up to `top_k` fragments in the store's relevance order.
    ///
    /// An empty result means cold memory, not failure.
    pub async fn recall(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        let keywords = extract_keywords(query);
        let filter = if keywords.is_empty() {
            None
        } else {
            Some(keywords.as_slice())
        };

        let matches = self.store.search(query, top_k, filter).await?;
        tracing::debug!(
            store = self.store.provider_name(),
            keywords = ?keywords,
            matches = matches.len(),
            "Recalled memory"
        );

        Ok(matches.into_iter().take(top_k).map(|m| m.text).collect())
    }
}

/// Persists gathered blocks tagged with the topic's keywords.
#[derive(Clone)]
pub struct MemoryUpsert {
    store: Arc<dyn MemoryStore>,
}

impl MemoryUpsert {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self { store }
    }

    /// Write one record keyed by `source_id`. Store failures propagate.
    pub async fn upsert(&self, source_id: &str, text: &str, topic: &str) -> Result<()> {
        let keywords = extract_keywords(topic);
        self.store.upsert(source_id, text, &keywords).await?;
        tracing::debug!(
            store = self.store.provider_name(),
            source_id,
            keywords = keywords.len(),
            "Upserted memory record"
        );
        Ok(())
    }
}
