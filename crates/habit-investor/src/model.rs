//! Domain Models
//!
//! Inputs and outputs of the what-if investment simulation. Prices and totals
//! are `f64`: the simulation needs fractional powers and square roots, and the
//! figures are estimates shown to a user, not ledger balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fixed days-per-month factor used to turn a daily habit into a monthly budget
pub const DAYS_PER_MONTH: f64 = 30.0;

/// One simulation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationRequest {
    /// Year the user started earning (January 1 is the first purchase month)
    pub start_year: i32,

    /// Amount spent on the habit per day
    pub daily_spend: f64,

    /// Security identifier understood by the price-history source
    pub symbol: String,

    /// Currency code the amounts are expressed in
    pub currency: String,
}

impl SimulationRequest {
    pub fn new(
        start_year: i32,
        daily_spend: f64,
        symbol: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            start_year,
            daily_spend,
            symbol: symbol.into(),
            currency: currency.into(),
        }
    }

    /// Budget invested every month
    pub fn monthly_spend(&self) -> f64 {
        self.daily_spend * DAYS_PER_MONTH
    }
}

/// A closing price observation from the price-history source
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MonthlyObservation {
    pub date: DateTime<Utc>,
    pub closing_price: f64,
}

impl MonthlyObservation {
    pub const fn new(date: DateTime<Utc>, closing_price: f64) -> Self {
        Self {
            date,
            closing_price,
        }
    }
}

/// Which computation produced a [`SimulationResult`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationOutcome {
    /// Month-by-month purchases over the full monthly history
    Detailed,
    /// Start/end price growth applied to the nominal total
    Fallback,
    /// No usable prices; only nominal totals are known
    Failed,
}

/// Result of a simulation. Absent metrics are omitted when serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub months_elapsed: i64,
    pub total_invested: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_units_held: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profit_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cagr_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
    pub used_fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Metrics produced by the month-by-month purchase simulation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetailedMetrics {
    pub months_elapsed: i64,
    pub total_invested: f64,
    pub total_units_held: f64,
    pub current_price: f64,
    pub total_value: f64,
    pub profit_percent: f64,
    pub cagr_percent: f64,
    pub volatility_percent: f64,
    pub sharpe_ratio: f64,
}

/// Metrics produced by the coarse start/end price estimate
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoarseMetrics {
    pub months_elapsed: i64,
    pub total_invested: f64,
    pub current_price: f64,
    pub total_value: f64,
    pub profit_percent: f64,
    pub cagr_percent: f64,
}

impl SimulationResult {
    pub const fn detailed(m: DetailedMetrics) -> Self {
        Self {
            months_elapsed: m.months_elapsed,
            total_invested: m.total_invested,
            total_units_held: Some(m.total_units_held),
            current_price: Some(m.current_price),
            total_value: Some(m.total_value),
            profit_percent: Some(m.profit_percent),
            cagr_percent: Some(m.cagr_percent),
            volatility_percent: Some(m.volatility_percent),
            sharpe_ratio: Some(m.sharpe_ratio),
            used_fallback: false,
            error_message: None,
        }
    }

    /// Coarse estimate; `reason` describes why the detailed path failed
    pub fn fallback(m: CoarseMetrics, reason: impl Into<String>) -> Self {
        Self {
            months_elapsed: m.months_elapsed,
            total_invested: m.total_invested,
            total_units_held: None,
            current_price: Some(m.current_price),
            total_value: Some(m.total_value),
            profit_percent: Some(m.profit_percent),
            cagr_percent: Some(m.cagr_percent),
            volatility_percent: None,
            sharpe_ratio: None,
            used_fallback: true,
            error_message: Some(reason.into()),
        }
    }

    pub fn failed(months_elapsed: i64, total_invested: f64, reason: impl Into<String>) -> Self {
        Self {
            months_elapsed,
            total_invested,
            total_units_held: None,
            current_price: None,
            total_value: None,
            profit_percent: None,
            cagr_percent: None,
            volatility_percent: None,
            sharpe_ratio: None,
            used_fallback: true,
            error_message: Some(reason.into()),
        }
    }

    pub const fn outcome(&self) -> SimulationOutcome {
        match (self.used_fallback, self.total_value) {
            (false, _) => SimulationOutcome::Detailed,
            (true, Some(_)) => SimulationOutcome::Fallback,
            (true, None) => SimulationOutcome::Failed,
        }
    }

    /// Difference between what the investment would be worth and what was spent
    pub fn missed_profit(&self) -> Option<f64> {
        self.total_value.map(|value| value - self.total_invested)
    }
}
