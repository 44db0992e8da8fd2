//! Static Price History
//!
//! Deterministic in-memory price series. Backs the `static` price source for
//! offline demos and every simulator test.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};

use super::{Granularity, PriceHistory};
use crate::catalog::CATALOG;
use crate::error::{InvestorError, Result};
use crate::model::MonthlyObservation;

type SeriesKey = (String, Granularity);

/// Scripted price history
#[derive(Debug, Default)]
pub struct StaticPriceHistory {
    series: HashMap<SeriesKey, Vec<MonthlyObservation>>,
    failures: HashMap<SeriesKey, String>,
    calls: AtomicUsize,
}

impl StaticPriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register observations for a symbol at one granularity
    pub fn with_observations(
        mut self,
        symbol: &str,
        granularity: Granularity,
        mut observations: Vec<MonthlyObservation>,
    ) -> Self {
        observations.sort_by_key(|o| o.date);
        self.series
            .insert((symbol.to_uppercase(), granularity), observations);
        self
    }

    /// Register one monthly close per month, starting on the first of `first_month`
    pub fn with_monthly_closes(self, symbol: &str, first_month: NaiveDate, closes: &[f64]) -> Self {
        let first = first_month.with_day(1).unwrap_or(first_month);
        let observations = closes
            .iter()
            .zip(0u32..)
            .filter_map(|(&close, i)| {
                first
                    .checked_add_months(Months::new(i))
                    .map(|d| MonthlyObservation::new(midnight(d), close))
            })
            .collect();
        self.with_observations(symbol, Granularity::Monthly, observations)
    }

    /// Register consecutive daily closes starting on `first_day`
    pub fn with_daily_closes(self, symbol: &str, first_day: NaiveDate, closes: &[f64]) -> Self {
        let observations = closes
            .iter()
            .zip(0u64..)
            .filter_map(|(&close, i)| {
                first_day
                    .checked_add_days(Days::new(i))
                    .map(|d| MonthlyObservation::new(midnight(d), close))
            })
            .collect();
        self.with_observations(symbol, Granularity::Daily, observations)
    }

    /// Make every request for `symbol` at `granularity` fail
    pub fn failing(mut self, symbol: &str, granularity: Granularity, reason: &str) -> Self {
        self.failures
            .insert((symbol.to_uppercase(), granularity), reason.into());
        self
    }

    /// Synthetic monthly series for every catalog security from `first_year`
    /// through `last_year`, served at both granularities.
    pub fn demo(first_year: i32, last_year: i32) -> Self {
        let Some(first) = NaiveDate::from_ymd_opt(first_year, 1, 1) else {
            return Self::new();
        };
        let months = u32::try_from((last_year - first_year + 1).max(0) * 12).unwrap_or(0);

        CATALOG
            .iter()
            .zip(1u32..)
            .fold(Self::new(), |history, (security, rank)| {
                // Each security gets its own drift and a gentle yearly wave.
                let monthly_growth = 1.0 + f64::from(rank) * 0.0012;
                let base = 10.0 * f64::from(rank);
                let closes: Vec<f64> = (0..months)
                    .map(|i| {
                        let t = f64::from(i);
                        let wave = 1.0 + 0.05 * (t * std::f64::consts::PI / 6.0).sin();
                        base * monthly_growth.powf(t) * wave
                    })
                    .collect();

                let history = history.with_monthly_closes(security.symbol, first, &closes);
                let monthly = history
                    .series
                    .get(&(security.symbol.to_string(), Granularity::Monthly))
                    .cloned()
                    .unwrap_or_default();
                history.with_observations(security.symbol, Granularity::Daily, monthly)
            })
    }

    /// Number of `history` requests served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::default()).and_utc()
}

#[async_trait]
impl PriceHistory for StaticPriceHistory {
    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<MonthlyObservation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = (symbol.to_uppercase(), granularity);

        if let Some(reason) = self.failures.get(&key) {
            return Err(InvestorError::Provider(reason.clone()));
        }

        Ok(self
            .series
            .get(&key)
            .map(|series| {
                series
                    .iter()
                    .filter(|o| o.date >= start && o.date <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "Static"
    }
}
