//! # deep-research
//!
//! An iterative research assistant. Given a topic, it repeatedly searches
//! web, video, encyclopedia and academic sources, folds what it finds into a
//! running summary with a local LLM, reflects on knowledge gaps to pick the
//! next query, and finally delivers a cited report by email and chat webhook.
//!
//! ## Overview
//!
//! deep-research can be used in two ways:
//!
//! 1. **As a command-line tool** - Run the `deep-research` binary
//! 2. **As a library** - Embed [`ResearchPipeline`] in your own program
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use deep_research::{ResearchConfig, ResearchPipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ResearchConfig::load("research.toml")?;
//!     let pipeline = ResearchPipeline::from_config(&config)?;
//!
//!     let output = pipeline.run("quantum computing").await?;
//!     println!("{}", output.report);
//!     Ok(())
//! }
//! ```
//!
//! ### Custom Collaborators
//!
//! Every external dependency sits behind a trait, so a pipeline can be
//! assembled from any mix of implementations:
//!
//! ```rust,ignore
//! use deep_research::{ResearchPipeline, PipelineOptions};
//! use deep_research::db::InMemoryMemoryStore;
//! use deep_research::sources::SourceSet;
//! use std::sync::Arc;
//!
//! let pipeline = ResearchPipeline::new(
//!     llm,                                   // Arc<dyn LLMClient>
//!     SourceSet::new(web, video, wiki, arxiv),
//!     Arc::new(InMemoryMemoryStore::new()),
//!     PipelineOptions { max_loops: 0, ..Default::default() },
//! )
//! .with_notifier(webhook);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `duckduckgo` | Keyless DuckDuckGo web search via daedra (default) |
//! | `email` | SMTP report delivery via lettre (default) |
//!
//! ## Modules
//!
//! - [`pipeline`] - Research state, reasoning steps and the orchestrator
//! - [`sources`] - Source connectors (Tavily, Perplexity, DuckDuckGo, YouTube, Wikipedia, arXiv)
//! - [`aggregate`] - Source block formatting, deduplication and truncation
//! - [`memory`] - Keyword extraction, memory recall and upsert
//! - [`db`] - Memory store backends (in-memory, Pinecone)
//! - [`llm`] - Reasoning service clients
//! - [`notify`] - Report delivery channels
//! - [`utils`] - TOML configuration
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Source block formatting and citation lists.
pub mod aggregate;
/// Command-line parsing and terminal output.
pub mod cli;
/// Memory store backends.
pub mod db;
/// Reasoning service clients.
pub mod llm;
/// Memory recall and upsert.
pub mod memory;
/// Report delivery channels.
pub mod notify;
/// Research state machine and reasoning steps.
pub mod pipeline;
/// Source connectors.
pub mod sources;
/// Core types and errors.
pub mod types;
/// Configuration loading.
pub mod utils;

// Re-export commonly used types
pub use db::{MemoryStore, MemoryStoreProvider};
pub use llm::{LLMClient, LLMSettings};
pub use notify::Notifier;
pub use pipeline::{PipelineOptions, ResearchOutput, ResearchPipeline, ResearchState};
pub use sources::{SourceConnector, SourceSet};
pub use types::{AppError, Result, SearchResponse, SourceKind, SourceResult};
pub use utils::toml_config::ResearchConfig;
