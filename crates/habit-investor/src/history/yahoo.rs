//! Yahoo Finance price history

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;
use yahoo_finance_api as yahoo;

use super::{Granularity, PriceHistory};
use crate::error::{InvestorError, Result};
use crate::model::MonthlyObservation;

/// Price history backed by Yahoo's chart API
#[derive(Clone, Debug, Default)]
pub struct YahooPriceHistory;

impl YahooPriceHistory {
    pub const fn new() -> Self {
        Self
    }

    fn to_offset(ts: DateTime<Utc>) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(ts.timestamp())
            .map_err(|e| InvestorError::DateRange(format!("{ts}: {e}")))
    }
}

#[async_trait]
impl PriceHistory for YahooPriceHistory {
    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<MonthlyObservation>> {
        if end <= start {
            return Err(InvestorError::DateRange(format!("{start} is not before {end}")));
        }

        let connector =
            yahoo::YahooConnector::new().map_err(|e| InvestorError::Provider(e.to_string()))?;

        let response = connector
            .get_quote_history_interval(
                symbol,
                Self::to_offset(start)?,
                Self::to_offset(end)?,
                granularity.interval(),
            )
            .await
            .map_err(|e| InvestorError::Provider(format!("{symbol}: {e}")))?;

        let quotes = response
            .quotes()
            .map_err(|e| InvestorError::Provider(format!("{symbol}: {e}")))?;

        let mut observations: Vec<MonthlyObservation> = quotes
            .iter()
            .filter(|q| q.close.is_finite())
            .filter_map(|q| {
                DateTime::from_timestamp(q.timestamp as i64, 0)
                    .map(|date| MonthlyObservation::new(date, q.close))
            })
            .collect();
        observations.sort_by_key(|o| o.date);

        tracing::debug!(
            symbol,
            interval = granularity.interval(),
            points = observations.len(),
            "Fetched Yahoo price history"
        );

        Ok(observations)
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_rejects_inverted_range() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let result = YahooPriceHistory::new()
            .history("AAPL", start, end, Granularity::Monthly)
            .await;
        assert!(matches!(result, Err(InvestorError::DateRange(_))));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_monthly_history() {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap();
        let history = YahooPriceHistory::new()
            .history("AAPL", start, end, Granularity::Monthly)
            .await
            .unwrap();

        assert!(history.len() >= 11);
        assert!(history.windows(2).all(|w| w[0].date <= w[1].date));
    }
}
