//! LLM Provider Strategy Pattern
//!
//! Common interface for language model backends. The chat flow only ever talks
//! to `dyn LlmProvider`, so Ollama can be swapped for any other backend.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let options = GenerationOptions::default().temperature(0.0);
//! let completion = provider.complete(&messages, &options).await?;
//! let verdict: Verdict = completion.json()?;
//! ```

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AssistantError, Result};
use crate::message::Message;

/// Configuration for LLM generation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g., "llama3.2")
    pub model: String,

    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Top-p nucleus sampling
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

const fn default_temperature() -> f32 {
    0.7
}
const fn default_max_tokens() -> u32 {
    512
}
const fn default_top_p() -> f32 {
    0.9
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "llama3.2".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

impl GenerationOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub const fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Response from an LLM completion
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Completion {
    /// The generated text
    pub content: String,

    /// Model that generated this response
    pub model: String,
}

impl Completion {
    /// Deserialize the first JSON object embedded in the completion text.
    ///
    /// Models tend to wrap JSON in prose or code fences, so everything outside
    /// the outermost braces is ignored.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let start = self
            .content
            .find('{')
            .ok_or_else(|| AssistantError::Parse("no JSON object in completion".into()))?;
        let end = self
            .content
            .rfind('}')
            .filter(|&end| end > start)
            .ok_or_else(|| AssistantError::Parse("unterminated JSON object".into()))?;

        Ok(serde_json::from_str(&self.content[start..=end])?)
    }
}

/// Information about a model
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
}

/// Strategy trait for LLM providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Provider name (e.g., "Ollama")
    fn name(&self) -> &str;

    /// Check if the provider is available and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Generate a completion from messages
    async fn complete(&self, messages: &[Message], options: &GenerationOptions)
    -> Result<Completion>;

    /// List available models
    async fn list_models(&self) -> Result<Vec<ModelInfo>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Verdict {
        is_valid: bool,
        reason: String,
    }

    fn completion(content: &str) -> Completion {
        Completion {
            content: content.into(),
            model: "test".into(),
        }
    }

    #[test]
    fn test_generation_options_defaults() {
        let opts = GenerationOptions::default();
        assert!((opts.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(opts.max_tokens, 512);
        assert_eq!(opts.model, "llama3.2");
    }

    #[test]
    fn test_json_inside_prose() {
        let c = completion(
            "Sure!\n```json\n{\"is_valid\": false, \"reason\": \"год в будущем\"}\n```",
        );
        let verdict: Verdict = c.json().unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.reason, "год в будущем");
    }

    #[test]
    fn test_json_missing() {
        let err = completion("no braces here").json::<Verdict>().unwrap_err();
        assert!(matches!(err, AssistantError::Parse(_)));
    }

    #[test]
    fn test_json_malformed() {
        let err = completion("{is_valid: nope}").json::<Verdict>().unwrap_err();
        assert!(matches!(err, AssistantError::Json(_)));
    }
}
