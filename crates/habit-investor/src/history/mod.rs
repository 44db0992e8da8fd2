//! Price History Sources
//!
//! Abstractions and implementations for historical closing prices.

mod fixture;
mod yahoo;

pub use fixture::StaticPriceHistory;
pub use yahoo::YahooPriceHistory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::MonthlyObservation;

/// Sampling interval of a price history request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One close per calendar month
    Monthly,
    /// The source's default sampling (daily closes)
    Daily,
}

impl Granularity {
    /// Interval name used by Yahoo's chart API
    pub const fn interval(self) -> &'static str {
        match self {
            Self::Monthly => "1mo",
            Self::Daily => "1d",
        }
    }
}

/// Historical price source (Strategy pattern)
///
/// Implementations return closes in ascending date order. An empty vector is
/// a valid answer; callers decide whether that counts as missing data.
#[async_trait]
pub trait PriceHistory: Send + Sync {
    async fn history(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Vec<MonthlyObservation>>;

    /// Source name for logs
    fn name(&self) -> &str;
}
