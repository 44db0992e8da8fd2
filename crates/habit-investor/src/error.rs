//! Error Types for the Habit Investor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, InvestorError>;

#[derive(Error, Debug)]
pub enum InvestorError {
    /// The price-history source answered with nothing
    #[error("No price data for {0}")]
    NoData(String),

    /// Not enough closes for a start/end comparison
    #[error("Insufficient price data for {symbol}: {points} closing price(s)")]
    InsufficientData { symbol: String, points: usize },

    /// The price-history source itself failed (network, unknown symbol, throttling)
    #[error("Price provider error: {0}")]
    Provider(String),

    #[error("Invalid closing price {price} for {symbol}")]
    InvalidPrice { symbol: String, price: f64 },

    /// A derived metric came out infinite or NaN
    #[error("Arithmetic error: {0}")]
    Arithmetic(String),

    #[error("Invalid date range: {0}")]
    DateRange(String),
}
