//! Semantic memory stores.
//!
//! The research pipeline writes gathered source blocks here and recalls
//! fragments from earlier cycles and runs.
//!
//! # Providers
//!
//! - `in-memory` (default) - process-local, keyword-overlap scoring
//! - `pinecone` - managed index with integrated embedding

#![allow(missing_docs)]

pub mod pinecone;
pub mod vectorstore;

pub use pinecone::PineconeStore;
pub use vectorstore::{InMemoryMemoryStore, MemoryMatch, MemoryStore, MemoryStoreProvider};
