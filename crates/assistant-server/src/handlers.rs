//! HTTP Handlers

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Instrument;

use habit_investor::{SimulationRequest, SimulationResult};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_connected: bool,
    pub price_source: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn bad_request(error: impl Into<String>, code: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookUser {
    /// Chat platforms send ids as strings or numbers
    #[serde(default)]
    pub id: Option<Value>,
}

/// Inbound chat-platform webhook payload
#[derive(Debug, Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub message: WebhookMessage,
    #[serde(default)]
    pub user: WebhookUser,
}

impl WebhookRequest {
    fn user_id(&self) -> Option<String> {
        match self.user.id.as_ref()? {
            Value::String(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    fn text(&self) -> Option<&str> {
        self.message.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct OutgoingMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub messages: Vec<OutgoingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct SimulateRequest {
    pub start_year: i32,
    pub daily_spend: f64,
    pub symbol: String,
    #[serde(default)]
    pub currency: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = match &state.llm {
        Some(llm) => llm.health_check().await.unwrap_or(false),
        None => false,
    };

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_connected,
        price_source: state.price_source.to_string(),
    })
}

/// Service description
pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Habit Investor API",
        "status": "running",
        "endpoints": {
            "webhook": "/webhook (POST)",
            "simulate": "/api/simulate (POST)",
            "health": "/health (GET)",
        }
    }))
}

/// Chat webhook: one user message in, one assistant reply out
pub async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, ApiError> {
    let (Some(user_id), Some(text)) = (payload.user_id(), payload.text()) else {
        tracing::warn!("Webhook without message text or user id");
        return Err(bad_request("Missing message or user ID", "MISSING_FIELDS"));
    };

    let span = tracing::info_span!(
        "webhook",
        request_id = %uuid::Uuid::new_v4(),
        user_id = %user_id,
    );
    let reply = state.flow.handle(&user_id, text).instrument(span).await;

    Ok(Json(WebhookResponse {
        messages: vec![OutgoingMessage {
            kind: "text",
            text: reply,
        }],
    }))
}

/// Run a simulation directly, without the questionnaire
pub async fn simulate(
    State(state): State<AppState>,
    Json(payload): Json<SimulateRequest>,
) -> Result<Json<SimulationResult>, ApiError> {
    if !(payload.daily_spend.is_finite() && payload.daily_spend >= 0.0) {
        return Err(bad_request(
            "daily_spend must be a non-negative number",
            "INVALID_AMOUNT",
        ));
    }
    let symbol = payload.symbol.trim();
    if symbol.is_empty() {
        return Err(bad_request("symbol is required", "MISSING_SYMBOL"));
    }

    let request = SimulationRequest::new(
        payload.start_year,
        payload.daily_spend,
        symbol.to_uppercase(),
        payload.currency.unwrap_or_else(|| "USD".into()),
    );
    let result = state.flow.simulator().simulate(&request).await;

    Ok(Json(result))
}

/// Full application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/health", get(health_check))
        .route("/webhook", post(webhook))
        .route("/api/simulate", post(simulate))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
