//! # assistant-core
//!
//! Provider-agnostic language model abstraction used by the habit investor
//! assistant to explain rejected answers.
//!
//! ```text
//! ┌──────────────┐      ┌─────────────────┐      ┌──────────────────┐
//! │  Chat flow   │ ───▶ │  LlmProvider    │ ───▶ │ Ollama / others  │
//! │ (questions)  │      │  (Strategy)     │      │                  │
//! └──────────────┘      └─────────────────┘      └──────────────────┘
//! ```

pub mod error;
pub mod message;
pub mod provider;

pub use error::{AssistantError, Result};
pub use message::{Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider, ModelInfo};
