//! Reasoning Service Clients
//!
//! This module provides the interface the pipeline uses to reach its external
//! reasoning service. The service is invoked three times per cycle:
//!
//! - query generation (structured output, `{"query": ...}`)
//! - summarization (free text, may contain deliberation markup)
//! - reflection (structured output, `{"follow_up_query": ...}`)
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`structured`] - JSON-mode reply parsing shared by the structured steps
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//!
//! # Example
//!
//! ```ignore
//! use deep_research::llm::{LLMClient, LLMSettings, ollama::OllamaClient};
//!
//! let client = OllamaClient::new(&LLMSettings::default())?;
//! let reply = client.generate_json("Return JSON", "{\"query\": ...}").await?;
//! ```

/// Core LLM client trait and settings.
pub mod client;
/// JSON-mode reply parsing.
pub mod structured;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use client::{LLMClient, LLMSettings};
pub use structured::parse_json_reply;
