//! # habit-investor
//!
//! "What if you had invested it instead?" An assistant that asks how much a
//! user spends on a bad habit and shows what that money would be worth had it
//! gone into a well-known stock or ETF every month.
//!
//! ## Simulation
//!
//! Money is invested on a fixed monthly schedule (daily spend × 30) starting
//! January 1 of the chosen year:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Detailed   monthly closes → units bought each month         │
//! │             → value, profit, CAGR, volatility, Sharpe        │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Fallback   first/last daily close → growth applied to the   │
//! │             nominal total (flagged as approximate)           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Failed     nominal months × monthly spend only              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every figure is an estimate in the user's own currency; exchange-rate
//! movements are ignored.

pub mod catalog;
pub mod chat;
pub mod error;
pub mod history;
pub mod model;
pub mod simulator;

pub use chat::{ChatFlow, Clarifier, Currency, MemorySessionStore, SessionStore};
pub use error::{InvestorError, Result};
pub use history::{Granularity, PriceHistory, StaticPriceHistory, YahooPriceHistory};
pub use model::{SimulationOutcome, SimulationRequest, SimulationResult};
pub use simulator::InvestmentSimulator;
