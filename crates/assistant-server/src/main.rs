//! Habit Investor HTTP Server
//!
//! Axum server exposing the questionnaire as a chat-platform webhook plus a
//! direct simulation endpoint.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use assistant_core::LlmProvider;
use assistant_runtime::OllamaProvider;
use habit_investor::{ChatFlow, Clarifier, PriceHistory, StaticPriceHistory, YahooPriceHistory};

use crate::config::{PriceSource, ServerConfig};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment before reading RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    let history: Arc<dyn PriceHistory> = match config.price_source {
        PriceSource::Yahoo => Arc::new(YahooPriceHistory::new()),
        PriceSource::Static => Arc::new(StaticPriceHistory::demo(1990, 2100)),
    };
    tracing::info!("Price history: {}", history.name());

    let mut flow = ChatFlow::new(history);
    let mut llm: Option<Arc<dyn LlmProvider>> = None;

    if config.llm_enabled {
        let provider = Arc::new(OllamaProvider::from_env());
        match provider.health_check().await {
            Ok(true) => tracing::info!("✓ Connected to Ollama, clarifying with {}", config.llm_model),
            Ok(false) | Err(_) => {
                tracing::warn!("⚠ Ollama not available - answers will not be clarified");
                tracing::warn!("  Make sure Ollama is running: ollama serve");
            }
        }
        flow = flow.with_clarifier(Clarifier::new(provider.clone(), config.llm_model.clone()));
        llm = Some(provider);
    } else {
        tracing::info!("LLM clarifications disabled (set LLM_ENABLED=true to enable)");
    }

    let state = AppState {
        flow: Arc::new(flow),
        llm,
        price_source: config.price_source,
    };

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 habit-investor server running on http://{}", config.bind_addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /              - Service description");
    tracing::info!("  GET  /health        - Health check");
    tracing::info!("  POST /webhook       - Chat webhook");
    tracing::info!("  POST /api/simulate  - Run a simulation");

    axum::serve(listener, app).await?;

    Ok(())
}
