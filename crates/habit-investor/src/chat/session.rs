//! Questionnaire Sessions
//!
//! Per-user answers collected so far and where the conversation stands.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::parse::Currency;

/// Question the assistant is waiting on
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Year,
    Habit,
    DailyCost,
    Currency,
    Confirmation,
}

/// Answers gathered for one user
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Questionnaire {
    pub stage: Stage,
    pub year: Option<i32>,
    pub habit: Option<String>,
    pub daily_spend: Option<f64>,
    pub currency: Option<Currency>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Questionnaire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `stage`, stamping the activity time
    pub fn advance(&mut self, stage: Stage) {
        self.stage = stage;
        self.updated_at = Some(Utc::now());
    }
}

/// Storage for in-progress questionnaires, keyed by user id
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, user_id: &str) -> Option<Questionnaire>;

    async fn save(&self, user_id: &str, questionnaire: Questionnaire);

    async fn remove(&self, user_id: &str);
}

/// Process-local session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Questionnaire>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, user_id: &str) -> Option<Questionnaire> {
        self.sessions.read().await.get(user_id).cloned()
    }

    async fn save(&self, user_id: &str, questionnaire: Questionnaire) {
        self.sessions
            .write()
            .await
            .insert(user_id.to_string(), questionnaire);
    }

    async fn remove(&self, user_id: &str) {
        self.sessions.write().await.remove(user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_questionnaire_advance() {
        let mut q = Questionnaire::new();
        assert_eq!(q.stage, Stage::Year);
        assert!(q.updated_at.is_none());

        q.year = Some(2015);
        q.habit = Some("кофе".into());
        q.daily_spend = Some(200.0);
        q.currency = Some(Currency::Rub);
        q.advance(Stage::Confirmation);

        assert_eq!(q.stage, Stage::Confirmation);
        assert!(q.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load("42").await.is_none());

        let mut q = Questionnaire::new();
        q.advance(Stage::Habit);
        store.save("42", q).await;

        assert_eq!(store.load("42").await.unwrap().stage, Stage::Habit);
        assert!(store.load("43").await.is_none());

        store.remove("42").await;
        assert!(store.load("42").await.is_none());
    }
}
