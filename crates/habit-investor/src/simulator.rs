//! Investment Simulator
//!
//! Answers "what would the money spent on a habit be worth today if it had
//! been invested every month instead".
//!
//! ```text
//!  monthly history ──ok──▶ buy monthly_spend / close each month ──▶ Detailed
//!        │
//!       err / empty
//!        ▼
//!  daily history ──≥2 closes──▶ grow nominal total at start/end CAGR ──▶ Fallback
//!        │
//!       err / <2 closes
//!        ▼
//!  nominal totals only ──────────────────────────────────────────────▶ Failed
//! ```
//!
//! `simulate` never returns an error: failures are reported through
//! `used_fallback` and `error_message` on the result.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::{InvestorError, Result};
use crate::history::{Granularity, PriceHistory};
use crate::model::{CoarseMetrics, DetailedMetrics, SimulationRequest, SimulationResult};

/// Annual risk-free rate subtracted in the Sharpe ratio
pub const RISK_FREE_RATE: f64 = 0.02;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Whole months from January of `start_year` through the month of `now`, inclusive
pub fn months_elapsed(start_year: i32, now: DateTime<Utc>) -> i64 {
    i64::from(now.year() - start_year) * 12 + i64::from(now.month())
}

/// Population standard deviation
fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

fn finite(metric: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvestorError::Arithmetic(format!("{metric} is {value}")))
    }
}

fn start_of_year(year: i32) -> Result<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
        .ok_or_else(|| InvestorError::DateRange(format!("year {year} is out of range")))
}

/// What-if simulator over a price-history source
#[derive(Clone)]
pub struct InvestmentSimulator {
    history: Arc<dyn PriceHistory>,
}

impl InvestmentSimulator {
    pub fn new(history: Arc<dyn PriceHistory>) -> Self {
        Self { history }
    }

    /// Simulate up to the current wall-clock time
    pub async fn simulate(&self, request: &SimulationRequest) -> SimulationResult {
        self.simulate_at(request, Utc::now()).await
    }

    /// Simulate with an explicit "now"
    pub async fn simulate_at(
        &self,
        request: &SimulationRequest,
        now: DateTime<Utc>,
    ) -> SimulationResult {
        let months = months_elapsed(request.start_year, now);

        let detailed_error = match self.detailed(request, now, months).await {
            Ok(metrics) => {
                tracing::debug!(
                    symbol = %request.symbol,
                    months,
                    total_value = metrics.total_value,
                    cagr_percent = metrics.cagr_percent,
                    "Monthly simulation complete"
                );
                return SimulationResult::detailed(metrics);
            }
            Err(e) => e,
        };

        tracing::warn!(
            symbol = %request.symbol,
            source = self.history.name(),
            error = %detailed_error,
            "Monthly simulation failed, estimating from start/end prices"
        );

        match self.coarse(request, now, months).await {
            Ok(metrics) => SimulationResult::fallback(metrics, detailed_error.to_string()),
            Err(e) => {
                tracing::error!(
                    symbol = %request.symbol,
                    error = %e,
                    "Start/end estimate failed, returning nominal totals"
                );
                SimulationResult::failed(months, months as f64 * request.monthly_spend(), e.to_string())
            }
        }
    }

    async fn detailed(
        &self,
        request: &SimulationRequest,
        now: DateTime<Utc>,
        months: i64,
    ) -> Result<DetailedMetrics> {
        let monthly_spend = request.monthly_spend();
        let start = start_of_year(request.start_year)?;

        let history = self
            .history
            .history(&request.symbol, start, now, Granularity::Monthly)
            .await?;

        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) => (first.closing_price, last.closing_price),
            _ => return Err(InvestorError::NoData(request.symbol.clone())),
        };

        let mut total_units = 0.0;
        let mut total_invested = 0.0;
        let mut returns = Vec::with_capacity(history.len());

        for observation in &history {
            let price = observation.closing_price;
            if !(price.is_finite() && price > 0.0) {
                return Err(InvestorError::InvalidPrice {
                    symbol: request.symbol.clone(),
                    price,
                });
            }
            total_units += monthly_spend / price;
            total_invested += monthly_spend;
            returns.push(price / first - 1.0);
        }

        let current_price = last;
        let total_value = total_units * current_price;
        let years = months as f64 / MONTHS_PER_YEAR;

        let cagr = if total_invested > 0.0 {
            finite("CAGR", (total_value / total_invested).powf(1.0 / years) - 1.0)?
        } else {
            0.0
        };

        let volatility = if returns.len() > 1 {
            std_dev(&returns) * MONTHS_PER_YEAR.sqrt()
        } else {
            0.0
        };

        let sharpe_ratio = if volatility > 0.0 {
            (cagr - RISK_FREE_RATE) / volatility
        } else {
            0.0
        };

        let profit_percent = if total_invested > 0.0 {
            (total_value - total_invested) / total_invested * 100.0
        } else {
            0.0
        };

        Ok(DetailedMetrics {
            months_elapsed: months,
            total_invested,
            total_units_held: total_units,
            current_price,
            total_value: finite("total value", total_value)?,
            profit_percent: finite("profit", profit_percent)?,
            cagr_percent: cagr * 100.0,
            volatility_percent: finite("volatility", volatility * 100.0)?,
            sharpe_ratio: finite("Sharpe ratio", sharpe_ratio)?,
        })
    }

    async fn coarse(
        &self,
        request: &SimulationRequest,
        now: DateTime<Utc>,
        months: i64,
    ) -> Result<CoarseMetrics> {
        let monthly_spend = request.monthly_spend();
        let total_invested = months as f64 * monthly_spend;
        let years = months as f64 / MONTHS_PER_YEAR;
        let start = start_of_year(request.start_year)?;

        let history = self
            .history
            .history(&request.symbol, start, now, Granularity::Daily)
            .await?;

        let (price_start, price_end) = match history.as_slice() {
            [first, .., last] => (first.closing_price, last.closing_price),
            _ => {
                return Err(InvestorError::InsufficientData {
                    symbol: request.symbol.clone(),
                    points: history.len(),
                });
            }
        };
        if !(price_start.is_finite() && price_start > 0.0) {
            return Err(InvestorError::InvalidPrice {
                symbol: request.symbol.clone(),
                price: price_start,
            });
        }

        let cagr = finite("CAGR", (price_end / price_start).powf(1.0 / years) - 1.0)?;
        let total_value = finite("total value", total_invested * (1.0 + cagr).powf(years))?;
        let profit_percent = if total_invested > 0.0 {
            (total_value - total_invested) / total_invested * 100.0
        } else {
            0.0
        };

        Ok(CoarseMetrics {
            months_elapsed: months,
            total_invested,
            current_price: price_end,
            total_value,
            profit_percent,
            cagr_percent: cagr * 100.0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StaticPriceHistory;
    use crate::model::SimulationOutcome;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn jan(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 1, 1).unwrap()
    }

    fn simulator(history: StaticPriceHistory) -> (InvestmentSimulator, Arc<StaticPriceHistory>) {
        let history = Arc::new(history);
        (InvestmentSimulator::new(history.clone()), history)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    /// [100, 110, 121, 133.1] then 133.1 until twelve months
    fn twelve_month_closes() -> Vec<f64> {
        let mut closes = vec![100.0, 110.0, 121.0, 133.1];
        closes.resize(12, 133.1);
        closes
    }

    #[test]
    fn test_months_elapsed() {
        assert_eq!(months_elapsed(2020, at(2020, 1, 5)), 1);
        assert_eq!(months_elapsed(2020, at(2020, 12, 15)), 12);
        assert_eq!(months_elapsed(2015, at(2026, 10, 19)), 142);
    }

    #[test]
    fn test_std_dev_is_population() {
        assert!(close(std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0));
        assert!(close(std_dev(&[3.0]), 0.0));
        assert!(close(std_dev(&[]), 0.0));
    }

    #[tokio::test]
    async fn test_detailed_monthly_purchases() {
        let closes = twelve_month_closes();
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_monthly_closes("VTI", jan(2020), &closes),
        );
        let request = SimulationRequest::new(2020, 500.0, "VTI", "RUB");

        let result = sim.simulate_at(&request, at(2020, 12, 15)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Detailed);
        assert!(!result.used_fallback);
        assert_eq!(result.error_message, None);
        assert_eq!(result.months_elapsed, 12);
        assert!(close(result.total_invested, 12.0 * 15_000.0));

        let expected_units: f64 = closes.iter().map(|p| 15_000.0 / p).sum();
        let units = result.total_units_held.unwrap();
        assert!(units > 0.0);
        assert!(close(units, expected_units));
        assert!(close(result.current_price.unwrap(), 133.1));

        let value = expected_units * 133.1;
        assert!(close(result.total_value.unwrap(), value));

        // One year elapsed, so CAGR equals the simple growth of the pot.
        let growth = value / 180_000.0 - 1.0;
        assert!(close(result.cagr_percent.unwrap(), growth * 100.0));
        assert!(close(result.profit_percent.unwrap(), growth * 100.0));

        let returns: Vec<f64> = closes.iter().map(|p| p / 100.0 - 1.0).collect();
        let volatility = std_dev(&returns) * 12f64.sqrt();
        assert!(close(result.volatility_percent.unwrap(), volatility * 100.0));
        assert!(close(result.sharpe_ratio.unwrap(), (growth - 0.02) / volatility));
    }

    #[tokio::test]
    async fn test_single_observation_has_no_volatility() {
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_monthly_closes("AAPL", jan(2024), &[150.0]),
        );
        let request = SimulationRequest::new(2024, 100.0, "AAPL", "USD");

        let result = sim.simulate_at(&request, at(2024, 1, 20)).await;

        assert_eq!(result.months_elapsed, 1);
        assert_eq!(result.volatility_percent, Some(0.0));
        assert_eq!(result.sharpe_ratio, Some(0.0));
        assert!(close(result.total_units_held.unwrap(), 3_000.0 / 150.0));
    }

    #[tokio::test]
    async fn test_zero_spend_has_zero_profit() {
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_monthly_closes("VTI", jan(2020), &twelve_month_closes()),
        );
        let request = SimulationRequest::new(2020, 0.0, "VTI", "USD");

        let result = sim.simulate_at(&request, at(2020, 12, 1)).await;

        assert!(!result.used_fallback);
        assert_eq!(result.total_invested, 0.0);
        assert_eq!(result.profit_percent, Some(0.0));
        assert_eq!(result.cagr_percent, Some(0.0));
        assert_eq!(result.total_value, Some(0.0));
    }

    #[tokio::test]
    async fn test_invested_counts_observed_months() {
        // Listed in July: only six purchases are possible in 2020.
        let (sim, _) = simulator(StaticPriceHistory::new().with_monthly_closes(
            "NVDA",
            NaiveDate::from_ymd_opt(2020, 7, 1).unwrap(),
            &[10.0; 6],
        ));
        let request = SimulationRequest::new(2020, 10.0, "NVDA", "USD");

        let result = sim.simulate_at(&request, at(2020, 12, 31)).await;

        assert_eq!(result.months_elapsed, 12);
        assert!(close(result.total_invested, 6.0 * 300.0));
    }

    #[tokio::test]
    async fn test_fallback_on_empty_monthly_history() {
        let mut daily = vec![100.0; 30];
        daily.push(121.0);
        let (sim, _) = simulator(StaticPriceHistory::new().with_daily_closes(
            "ZZZZ",
            NaiveDate::from_ymd_opt(2019, 1, 2).unwrap(),
            &daily,
        ));
        let request = SimulationRequest::new(2019, 500.0, "ZZZZ", "RUB");

        let result = sim.simulate_at(&request, at(2020, 12, 10)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Fallback);
        assert!(result.used_fallback);
        assert_eq!(result.months_elapsed, 24);
        assert!(close(result.total_invested, 24.0 * 15_000.0));
        // Two years of 21% total growth is 10% a year.
        assert!(close(result.cagr_percent.unwrap(), 10.0));
        assert!(close(result.total_value.unwrap(), 360_000.0 * 1.21));
        assert!(close(result.profit_percent.unwrap(), 21.0));
        assert_eq!(result.current_price, Some(121.0));
        assert_eq!(result.total_units_held, None);
        assert_eq!(result.volatility_percent, None);
        assert_eq!(result.sharpe_ratio, None);
        assert!(result.error_message.unwrap().contains("No price data for ZZZZ"));
    }

    #[tokio::test]
    async fn test_fallback_on_provider_error() {
        let (sim, _) = simulator(
            StaticPriceHistory::new()
                .failing("TSLA", Granularity::Monthly, "rate limited")
                .with_daily_closes("TSLA", jan(2022), &[50.0, 55.0]),
        );
        let request = SimulationRequest::new(2022, 10.0, "TSLA", "USD");

        let result = sim.simulate_at(&request, at(2022, 6, 1)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Fallback);
        assert!(result.error_message.unwrap().contains("rate limited"));
    }

    #[tokio::test]
    async fn test_fallback_on_zero_price() {
        let (sim, _) = simulator(
            StaticPriceHistory::new()
                .with_monthly_closes("QQQ", jan(2021), &[100.0, 0.0, 120.0])
                .with_daily_closes("QQQ", jan(2021), &[100.0, 120.0]),
        );
        let request = SimulationRequest::new(2021, 10.0, "QQQ", "USD");

        let result = sim.simulate_at(&request, at(2021, 3, 15)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Fallback);
        assert!(result.error_message.unwrap().contains("Invalid closing price"));
    }

    #[tokio::test]
    async fn test_fallback_on_overflowing_growth() {
        // Valid closes whose ratio overflows, so the growth rate is infinite.
        let (sim, _) = simulator(
            StaticPriceHistory::new()
                .with_monthly_closes("GME", jan(2021), &[1e-300, 1e300])
                .with_daily_closes("GME", jan(2021), &[100.0, 110.0]),
        );
        let request = SimulationRequest::new(2021, 10.0, "GME", "USD");

        let result = sim.simulate_at(&request, at(2021, 2, 15)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Fallback);
        assert!(result.total_value.unwrap().is_finite());
        let message = result.error_message.unwrap();
        assert!(message.contains("Arithmetic error"));
        assert!(message.contains("CAGR"));
    }

    #[tokio::test]
    async fn test_hard_failure_on_zero_first_daily_close() {
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_daily_closes("IPO", jan(2022), &[0.0, 100.0]),
        );
        let request = SimulationRequest::new(2022, 10.0, "IPO", "USD");

        let result = sim.simulate_at(&request, at(2022, 3, 1)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Failed);
        assert_eq!(result.total_value, None);
        assert!(close(result.total_invested, 3.0 * 300.0));
        assert!(result.error_message.unwrap().contains("Invalid closing price 0 for IPO"));
    }

    #[tokio::test]
    async fn test_hard_failure_when_no_data_anywhere() {
        let (sim, history) = simulator(StaticPriceHistory::new());
        let request = SimulationRequest::new(2020, 500.0, "ZZZZ", "RUB");

        let result = sim.simulate_at(&request, at(2020, 12, 15)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Failed);
        assert!(result.used_fallback);
        assert_eq!(result.months_elapsed, 12);
        assert!(close(result.total_invested, 180_000.0));
        assert_eq!(result.current_price, None);
        assert_eq!(result.total_value, None);
        assert_eq!(result.profit_percent, None);
        assert_eq!(result.cagr_percent, None);
        assert_eq!(result.total_units_held, None);
        assert!(result.error_message.is_some());
        // One detailed attempt, one fallback attempt, no retries.
        assert_eq!(history.calls(), 2);
    }

    #[tokio::test]
    async fn test_hard_failure_with_single_daily_close() {
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_daily_closes("AMZN", jan(2023), &[90.0]),
        );
        let request = SimulationRequest::new(2023, 20.0, "AMZN", "EUR");

        let result = sim.simulate_at(&request, at(2023, 5, 1)).await;

        assert_eq!(result.outcome(), SimulationOutcome::Failed);
        assert!(result.error_message.unwrap().contains("Insufficient"));
    }

    #[tokio::test]
    async fn test_repeated_runs_are_identical() {
        let (sim, _) = simulator(
            StaticPriceHistory::new().with_monthly_closes("VTI", jan(2020), &twelve_month_closes()),
        );
        let request = SimulationRequest::new(2020, 123.45, "VTI", "USD");
        let now = at(2020, 12, 15);

        let first = sim.simulate_at(&request, now).await;
        let second = sim.simulate_at(&request, now).await;
        assert_eq!(first, second);
    }
}
