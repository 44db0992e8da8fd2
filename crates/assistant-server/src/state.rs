//! Application State

use std::sync::Arc;

use assistant_core::LlmProvider;
use habit_investor::ChatFlow;

use crate::config::PriceSource;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Questionnaire driver, also owns the simulator
    pub flow: Arc<ChatFlow>,

    /// LLM provider (None when clarifications are disabled)
    pub llm: Option<Arc<dyn LlmProvider>>,

    pub price_source: PriceSource,
}
