//! Reasoning-service client abstraction
//!
//! The pipeline talks to its reasoning service through [`LLMClient`] only:
//! - **free text** for summarization
//! - **structured output** (JSON mode) for query generation and reflection
//!
//! Every invocation is deterministic (temperature fixed at zero by the
//! implementations the pipeline constructs).

use crate::types::Result;
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing the pipeline.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate a completion from a prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generate in structured-output mode.
    ///
    /// The reply is expected to be a single JSON object; parsing is left to
    /// the caller (see [`super::structured`]).
    async fn generate_json(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Reasoning-service settings shared by every call of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct LLMSettings {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for LLMSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            temperature: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_deterministic() {
        let settings = LLMSettings::default();
        assert_eq!(settings.temperature, 0.0);
        assert_eq!(settings.base_url, "http://localhost:11434");
    }
}
