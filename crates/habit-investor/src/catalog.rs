//! Security Catalog
//!
//! Well-known stocks and ETFs the assistant picks from when showing what a
//! habit could have turned into.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::history::{Granularity, PriceHistory};

/// Symbol used when no catalog security has any data at all
pub const DEFAULT_SYMBOL: &str = "AAPL";

/// A security the assistant may suggest
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Security {
    pub symbol: &'static str,
    pub description: &'static str,
}

pub const CATALOG: &[Security] = &[
    Security {
        symbol: "VTI",
        description: "Total Stock Market ETF - индексный фонд всего рынка США",
    },
    Security {
        symbol: "QQQ",
        description: "Nasdaq-100 ETF - индексный фонд технологических компаний",
    },
    Security {
        symbol: "AAPL",
        description: "Apple - технологическая компания, производитель iPhone и Mac",
    },
    Security {
        symbol: "MSFT",
        description: "Microsoft - технологическая компания, разработчик Windows и Office",
    },
    Security {
        symbol: "GOOGL",
        description: "Alphabet (Google) - технологическая компания, владелец поисковой системы Google",
    },
    Security {
        symbol: "AMZN",
        description: "Amazon - технологическая компания, крупнейший онлайн-ритейлер",
    },
    Security {
        symbol: "TSLA",
        description: "Tesla - производитель электромобилей и солнечных панелей",
    },
    Security {
        symbol: "NVDA",
        description: "NVIDIA - производитель графических процессоров и чипов для ИИ",
    },
    Security {
        symbol: "BRK-B",
        description: "Berkshire Hathaway - инвестиционная компания Уоррена Баффета",
    },
];

/// Catalog description, or a placeholder for unknown symbols
pub fn describe(symbol: &str) -> &'static str {
    CATALOG
        .iter()
        .find(|s| s.symbol.eq_ignore_ascii_case(symbol))
        .map_or("Нет описания", |s| s.description)
}

/// Catalog symbols with at least one close in `[start, end]`
async fn with_data(
    history: &dyn PriceHistory,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<&'static str> {
    let mut available = Vec::new();
    for security in CATALOG {
        match history
            .history(security.symbol, start, end, Granularity::Monthly)
            .await
        {
            Ok(observations) if !observations.is_empty() => available.push(security.symbol),
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(symbol = security.symbol, error = %e, "Skipping security");
            }
        }
    }
    available
}

/// Pick a random catalog security that was already trading in `start_year`.
///
/// Falls back to any security with data in the last month, then to
/// [`DEFAULT_SYMBOL`].
pub async fn pick_symbol(
    history: &dyn PriceHistory,
    start_year: i32,
    now: DateTime<Utc>,
) -> &'static str {
    if let Some(year_start) = chrono::NaiveDate::from_ymd_opt(start_year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
    {
        let year_end = (year_start + Duration::days(366)).min(now);
        if year_start < year_end {
            let candidates = with_data(history, year_start, year_end).await;
            let picked = candidates.choose(&mut rand::thread_rng()).copied();
            if let Some(symbol) = picked {
                return symbol;
            }
        }
        tracing::info!(start_year, "No catalog security traded that year, widening search");
    }

    let recent = with_data(history, now - Duration::days(31), now).await;
    let picked = recent.choose(&mut rand::thread_rng()).copied();
    picked.unwrap_or_else(|| {
        tracing::warn!(source = history.name(), "No catalog security has recent data");
        DEFAULT_SYMBOL
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::StaticPriceHistory;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_describe() {
        assert!(describe("brk-b").starts_with("Berkshire"));
        assert_eq!(describe("ZZZZ"), "Нет описания");
    }

    #[tokio::test]
    async fn test_picks_only_securities_trading_that_year() {
        let history = StaticPriceHistory::new()
            .with_monthly_closes("MSFT", NaiveDate::from_ymd_opt(1995, 1, 1).unwrap(), &[1.0; 400])
            .with_monthly_closes("TSLA", NaiveDate::from_ymd_opt(2010, 7, 1).unwrap(), &[1.0; 170]);

        for _ in 0..20 {
            assert_eq!(pick_symbol(&history, 1999, now()).await, "MSFT");
        }
    }

    #[tokio::test]
    async fn test_widens_to_recent_data() {
        let history = StaticPriceHistory::new().with_monthly_closes(
            "NVDA",
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
            &[100.0, 110.0],
        );
        assert_eq!(pick_symbol(&history, 1985, now()).await, "NVDA");
    }

    #[tokio::test]
    async fn test_default_when_nothing_available() {
        let history = StaticPriceHistory::new();
        assert_eq!(pick_symbol(&history, 2010, now()).await, DEFAULT_SYMBOL);
    }
}
