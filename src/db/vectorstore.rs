//! Memory Store Abstraction Layer
//!
//! The research pipeline persists every gathered source block into a semantic
//! store and recalls relevant fragments from earlier runs. Embedding and
//! indexing are the store's concern: records go in as plain text plus a
//! keyword list, queries go in as plain text.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │             MemoryStore Trait            │
//! ├──────────────────────────────────────────┤
//! │      upsert       │       search         │
//! └──────────────────────────────────────────┘
//!          ▲                      ▲
//!    ┌─────┴──────┐         ┌─────┴─────┐
//!    │  InMemory  │         │ Pinecone  │
//!    │ (default)  │         │  (cloud)  │
//!    └────────────┘         └───────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use deep_research::db::{MemoryStore, MemoryStoreProvider};
//!
//! let store = MemoryStoreProvider::InMemory.create_store()?;
//! store.upsert("web_0", "Qubits hold superposition", &["qubits".into()]).await?;
//! let hits = store.search("qubits", 5, None).await?;
//! ```

use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// Memory Store Provider Configuration
// ============================================================================

/// Configuration for memory store backends, as written in `[memory]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "kebab-case")]
pub enum MemoryStoreProvider {
    /// Process-local store. Nothing survives the process.
    #[default]
    InMemory,

    /// Pinecone index with integrated embedding.
    Pinecone {
        /// Index host, e.g. `https://research-abc123.svc.us-east-1.pinecone.io`.
        index_host: String,
        /// Namespace records are written to. Empty selects the default namespace.
        #[serde(default)]
        namespace: String,
        /// Environment variable holding the API key.
        #[serde(default = "default_pinecone_api_key_env")]
        api_key_env: String,
    },
}

fn default_pinecone_api_key_env() -> String {
    "PINECONE_API_KEY".to_string()
}

impl MemoryStoreProvider {
    /// Build the store for this provider, resolving secrets from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Configuration`] when the Pinecone API key variable
    /// is unset.
    pub fn create_store(&self) -> Result<Box<dyn MemoryStore>> {
        match self {
            MemoryStoreProvider::InMemory => Ok(Box::new(InMemoryMemoryStore::new())),
            MemoryStoreProvider::Pinecone {
                index_host,
                namespace,
                api_key_env,
            } => {
                let api_key = std::env::var(api_key_env).map_err(|_| {
                    AppError::Configuration(format!(
                        "Pinecone API key not found in environment variable '{}'",
                        api_key_env
                    ))
                })?;
                let store =
                    super::pinecone::PineconeStore::new(index_host.clone(), namespace.clone(), api_key)?;
                Ok(Box::new(store))
            }
        }
    }

    /// Provider name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            MemoryStoreProvider::InMemory => "in-memory",
            MemoryStoreProvider::Pinecone { .. } => "pinecone",
        }
    }
}

// ============================================================================
// Memory Store Trait
// ============================================================================

/// A matched record returned by [`MemoryStore::search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatch {
    pub id: String,
    pub text: String,
    /// Store-specific relevance score, higher is more relevant.
    pub score: f32,
}

/// Abstract trait for semantic memory operations.
///
/// # Implementors
///
/// - `InMemoryMemoryStore` - process-local keyword-overlap store
/// - `PineconeStore` - Pinecone integrated-embedding index
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Get the name of this memory store provider.
    fn provider_name(&self) -> &'static str;

    /// Write one record keyed by `id`, replacing any existing record with
    /// the same id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Memory`] when the store is unreachable or rejects
    /// the write.
    async fn upsert(&self, id: &str, text: &str, keywords: &[String]) -> Result<()>;

    /// Similarity search over stored text.
    ///
    /// When `keyword_filter` is given, only records sharing at least one
    /// keyword with it are eligible.
    ///
    /// # Returns
    ///
    /// Up to `top_k` matches in relevance order.
    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        keyword_filter: Option<&[String]>,
    ) -> Result<Vec<MemoryMatch>>;
}

// ============================================================================
// In-Memory Store
// ============================================================================

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory store scoring records by keyword overlap with the query.
///
/// Shared between concurrent runs through the inner `Arc`; a clone sees the
/// same records.
#[derive(Clone)]
pub struct InMemoryMemoryStore {
    records: Arc<RwLock<HashMap<String, StoredRecord>>>,
}

struct StoredRecord {
    text: String,
    keywords: HashSet<String>,
    /// Insertion sequence, used to break score ties deterministically.
    seq: u64,
}

impl InMemoryMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Fraction of query terms found in the record's text or keywords.
    fn overlap_score(query_terms: &[String], record: &StoredRecord) -> f32 {
        if query_terms.is_empty() {
            return 0.0;
        }
        let text = record.text.to_lowercase();
        let hits = query_terms
            .iter()
            .filter(|term| record.keywords.contains(*term) || text.contains(term.as_str()))
            .count();
        hits as f32 / query_terms.len() as f32
    }
}

impl Default for InMemoryMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryStore for InMemoryMemoryStore {
    fn provider_name(&self) -> &'static str {
        "in-memory"
    }

    async fn upsert(&self, id: &str, text: &str, keywords: &[String]) -> Result<()> {
        let mut records = self.records.write();
        let seq = records.len() as u64;
        let seq = records.get(id).map(|r| r.seq).unwrap_or(seq);
        records.insert(
            id.to_string(),
            StoredRecord {
                text: text.to_string(),
                keywords: keywords.iter().cloned().collect(),
                seq,
            },
        );
        Ok(())
    }

    async fn search(
        &self,
        query_text: &str,
        top_k: usize,
        keyword_filter: Option<&[String]>,
    ) -> Result<Vec<MemoryMatch>> {
        let query_terms = crate::memory::extract_keywords(query_text);
        let records = self.records.read();

        let mut matches: Vec<(u64, MemoryMatch)> = records
            .iter()
            .filter(|(_, record)| match keyword_filter {
                Some(filter) => filter.iter().any(|k| record.keywords.contains(k)),
                None => true,
            })
            .filter_map(|(id, record)| {
                let score = Self::overlap_score(&query_terms, record);
                if score > 0.0 {
                    Some((
                        record.seq,
                        MemoryMatch {
                            id: id.clone(),
                            text: record.text.clone(),
                            score,
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        // Sort by score descending, oldest first on ties
        matches.sort_by(|(seq_a, a), (seq_b, b)| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(seq_a.cmp(seq_b))
        });

        Ok(matches.into_iter().take(top_k).map(|(_, m)| m).collect())
    }
}
