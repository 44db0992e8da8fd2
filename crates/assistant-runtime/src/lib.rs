//! # assistant-runtime
//!
//! Concrete LLM providers for the habit investor assistant.
//!
//! - **Ollama** (default feature): local inference via Ollama
//!
//! ```rust,ignore
//! use assistant_runtime::OllamaProvider;
//!
//! let provider: Arc<dyn LlmProvider> = Arc::new(OllamaProvider::from_env());
//! ```

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "ollama")]
pub use ollama::{OllamaConfig, OllamaProvider};

pub use assistant_core::{AssistantError, LlmProvider, Message, Result, Role};
