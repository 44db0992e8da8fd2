//! Questionnaire Chat Flow
//!
//! Walks a user through five questions (start year, habit, daily cost,
//! currency, confirmation), then simulates what the habit money would have
//! become and renders the result.
//!
//! ```text
//! Year ─▶ Habit ─▶ DailyCost ─▶ Currency ─▶ Confirmation ─▶ result
//!                                               │   ▲
//!                                               └───┘ own monthly sum
//! ```

pub mod assist;
pub mod parse;
pub mod render;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::catalog;
use crate::history::PriceHistory;
use crate::model::{DAYS_PER_MONTH, SimulationRequest};
use crate::simulator::InvestmentSimulator;

pub use assist::{Clarifier, Verdict};
pub use parse::Currency;
pub use render::{format_currency, format_percentage};
pub use session::{MemorySessionStore, Questionnaire, SessionStore, Stage};

pub const GREETING: &str = "Привет! Я финансовый ассистент. Давай начнем с того, \
с какого года ты начал работать и получать зарплату?";

const ASK_HABIT: &str = "Хорошо, спасибо за информацию. Какая вредная привычка у тебя есть? \
(кофе, сигареты, фастфуд и т.д.)";

const ASK_DAILY_COST: &str = "Сколько примерно ты тратишь на эту вредную привычку в день?";

const ASK_CURRENCY: &str = "В какой валюте ты тратишь эти деньги?";

const RETRY_HABIT: &str = "Опиши привычку чуть подробнее!";

const RETRY_DAILY_COST: &str = "Пожалуйста, укажи сумму в день (например: 500 или пятьсот)";

const RETRY_CONFIRMATION: &str = "Если готов, напиши 'да', 'готов', 'ок' или предложи свою сумму в месяц!";

fn retry_year(current_year: i32) -> String {
    format!(
        "Пожалуйста, укажи год цифрами от {} до {current_year}",
        parse::MIN_YEAR
    )
}

fn retry_currency() -> String {
    let codes: Vec<&str> = Currency::ALL.iter().map(|c| c.code()).collect();
    format!("Пожалуйста, выбери валюту из списка: {}", codes.join(", "))
}

fn ask_confirmation(daily_spend: f64, currency: Currency) -> String {
    let monthly = (daily_spend * DAYS_PER_MONTH).trunc();
    format!("Ты тратишь примерно {monthly} {currency} в месяц. Готов откладывать такую сумму?")
}

/// The question asked at `stage`
fn question(questionnaire: &Questionnaire) -> String {
    match questionnaire.stage {
        Stage::Year => GREETING.into(),
        Stage::Habit => ASK_HABIT.into(),
        Stage::DailyCost => ASK_DAILY_COST.into(),
        Stage::Currency => ASK_CURRENCY.into(),
        Stage::Confirmation => match (questionnaire.daily_spend, questionnaire.currency) {
            (Some(daily), Some(currency)) => ask_confirmation(daily, currency),
            _ => RETRY_CONFIRMATION.into(),
        },
    }
}

/// Conversation driver shared by every transport
pub struct ChatFlow {
    sessions: Arc<dyn SessionStore>,
    history: Arc<dyn PriceHistory>,
    simulator: InvestmentSimulator,
    clarifier: Option<Clarifier>,
    // One lock per user with a message in flight; idle entries are pruned.
    turns: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ChatFlow {
    pub fn new(history: Arc<dyn PriceHistory>) -> Self {
        Self {
            sessions: Arc::new(MemorySessionStore::new()),
            simulator: InvestmentSimulator::new(history.clone()),
            history,
            clarifier: None,
            turns: Mutex::default(),
        }
    }

    #[must_use]
    pub fn with_sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Explain rejected answers with a language model
    #[must_use]
    pub fn with_clarifier(mut self, clarifier: Clarifier) -> Self {
        self.clarifier = Some(clarifier);
        self
    }

    pub const fn simulator(&self) -> &InvestmentSimulator {
        &self.simulator
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    pub async fn handle(&self, user_id: &str, text: &str) -> String {
        self.handle_at(user_id, text, Utc::now()).await
    }

    /// Wait until no other message from `user_id` is being handled
    async fn user_turn(&self, user_id: &str) -> OwnedMutexGuard<()> {
        let turn = {
            let mut turns = self.turns.lock().await;
            turns.retain(|_, turn| Arc::strong_count(turn) > 1);
            turns.entry(user_id.to_string()).or_default().clone()
        };
        turn.lock_owned().await
    }

    /// Reply to one message, with an explicit "now".
    ///
    /// Messages from the same user are handled one at a time, so concurrent
    /// deliveries cannot overwrite each other's answers.
    pub async fn handle_at(&self, user_id: &str, text: &str, now: DateTime<Utc>) -> String {
        let _turn = self.user_turn(user_id).await;
        let text = text.trim();

        if text.starts_with("/start") {
            tracing::info!(user_id, "Questionnaire restarted");
            self.sessions.save(user_id, Questionnaire::new()).await;
            return GREETING.into();
        }

        let existing = self.sessions.load(user_id).await;
        let first_contact = existing.is_none();
        let mut questionnaire = existing.unwrap_or_default();
        let stage = questionnaire.stage;
        tracing::debug!(user_id, ?stage, "Handling answer");

        let reply = match stage {
            Stage::Year => match parse::parse_year(text, now.year()) {
                Some(year) => {
                    questionnaire.year = Some(year);
                    questionnaire.advance(Stage::Habit);
                    Ok(ASK_HABIT.to_string())
                }
                None if first_contact => {
                    self.sessions.save(user_id, questionnaire).await;
                    return GREETING.into();
                }
                None => Err(retry_year(now.year())),
            },
            Stage::Habit => match parse::validate_habit(text) {
                Some(habit) => {
                    questionnaire.habit = Some(habit);
                    questionnaire.advance(Stage::DailyCost);
                    Ok(ASK_DAILY_COST.to_string())
                }
                None => Err(RETRY_HABIT.to_string()),
            },
            Stage::DailyCost => match parse::parse_amount(text) {
                Some(daily) => {
                    questionnaire.daily_spend = Some(daily);
                    questionnaire.advance(Stage::Currency);
                    Ok(ASK_CURRENCY.to_string())
                }
                None => Err(RETRY_DAILY_COST.to_string()),
            },
            Stage::Currency => match (parse::parse_currency(text), questionnaire.daily_spend) {
                (Some(currency), Some(daily)) => {
                    questionnaire.currency = Some(currency);
                    questionnaire.advance(Stage::Confirmation);
                    Ok(ask_confirmation(daily, currency))
                }
                _ => Err(retry_currency()),
            },
            Stage::Confirmation => {
                if parse::is_confirmation(text) {
                    return self.finish(user_id, &questionnaire, now).await;
                }
                match (parse::parse_amount(text), questionnaire.currency) {
                    (Some(monthly), Some(currency)) => {
                        let daily = monthly / DAYS_PER_MONTH;
                        questionnaire.daily_spend = Some(daily);
                        questionnaire.advance(Stage::Confirmation);
                        Ok(ask_confirmation(daily, currency))
                    }
                    _ => Err(RETRY_CONFIRMATION.to_string()),
                }
            }
        };

        let reply = match reply {
            Ok(next_question) => next_question,
            Err(retry) => self.reprompt(&questionnaire, text, retry).await,
        };
        self.sessions.save(user_id, questionnaire).await;
        reply
    }

    /// Re-ask the current question, explained by the language model when one is configured
    async fn reprompt(&self, questionnaire: &Questionnaire, answer: &str, fallback: String) -> String {
        let Some(clarifier) = &self.clarifier else {
            return fallback;
        };
        match clarifier.clarification(questionnaire.stage, answer).await {
            Some(prefix) => format!("{prefix}\n\n{}", question(questionnaire)),
            None => fallback,
        }
    }

    async fn finish(&self, user_id: &str, questionnaire: &Questionnaire, now: DateTime<Utc>) -> String {
        let (Some(year), Some(habit), Some(daily_spend), Some(currency)) = (
            questionnaire.year,
            questionnaire.habit.as_deref(),
            questionnaire.daily_spend,
            questionnaire.currency,
        ) else {
            tracing::warn!(user_id, "Incomplete questionnaire at confirmation, restarting");
            self.sessions.save(user_id, Questionnaire::new()).await;
            return GREETING.into();
        };

        let symbol = catalog::pick_symbol(self.history.as_ref(), year, now).await;
        let request = SimulationRequest::new(year, daily_spend, symbol, currency.code());
        let result = self.simulator.simulate_at(&request, now).await;

        tracing::info!(
            user_id,
            symbol,
            year,
            outcome = ?result.outcome(),
            "Questionnaire complete"
        );
        self.sessions.remove(user_id).await;

        render::final_message(
            &render::Answers {
                symbol,
                habit,
                year,
                daily_spend,
                currency,
            },
            &result,
        )
    }
}
