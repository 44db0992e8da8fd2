//! LLM Clarifications
//!
//! When a heuristic rejects an answer, an optional language model explains
//! what was wrong so the re-prompt is friendlier.

use std::sync::Arc;

use assistant_core::{GenerationOptions, LlmProvider, Message};
use serde::Deserialize;

use super::session::Stage;

const SYSTEM_PROMPT: &str = "Ты дружелюбный, но требовательный финансовый ассистент. \
Проверяешь ответы пользователя на вопросы анкеты. Отвечай только JSON-объектом \
{\"is_valid\": true/false, \"reason\": \"причина\", \"suggestion\": \"пример корректного ответа\"} \
на русском языке.";

/// The model's judgement of an answer
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub suggestion: String,
}

fn question(stage: Stage, answer: &str) -> String {
    match stage {
        Stage::Year => format!(
            "Пользователь должен ввести год начала работы (например, 2010). Вот его ответ: '{answer}'. \
             Это корректный год? Если нет, объясни почему и приведи пример корректного ответа."
        ),
        Stage::Habit => format!(
            "Пользователь должен кратко описать вредную привычку (например, курение, алкоголь, сладкое). \
             Вот его ответ: '{answer}'. Это корректное описание привычки? Если нет, объясни почему \
             и приведи пример корректного ответа."
        ),
        Stage::DailyCost => format!(
            "Пользователь должен ввести сумму трат в день (например, 500, 5.50, 1000). Вот его ответ: \
             '{answer}'. Это корректная сумма? Если нет, объясни почему и приведи пример корректного ответа."
        ),
        Stage::Currency => format!(
            "Пользователь должен ввести реальную валюту (например, рубли, доллары, евро, тенге, драм, \
             USD, EUR, RUB, AMD). Вот его ответ: '{answer}'. Это корректная валюта? Если нет, объясни \
             почему и приведи пример корректного ответа."
        ),
        Stage::Confirmation => format!(
            "Пользователь должен согласиться откладывать сумму (да, готов, ок) или предложить свою сумму \
             в месяц. Вот его ответ: '{answer}'. Это согласие или сумма? Если нет, объясни почему."
        ),
    }
}

/// Asks a language model why an answer was rejected
#[derive(Clone)]
pub struct Clarifier {
    llm: Arc<dyn LlmProvider>,
    options: GenerationOptions,
}

impl Clarifier {
    pub fn new(llm: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            llm,
            options: GenerationOptions::default()
                .model(model)
                .temperature(0.0)
                .max_tokens(200),
        }
    }

    /// Verdict for `answer`, or `None` if the model is unreachable or replies
    /// with something that is not a verdict.
    pub async fn verdict(&self, stage: Stage, answer: &str) -> Option<Verdict> {
        let messages = [Message::system(SYSTEM_PROMPT), Message::user(question(stage, answer))];

        let completion = match self.llm.complete(&messages, &self.options).await {
            Ok(completion) => completion,
            Err(e) => {
                tracing::warn!(provider = self.llm.name(), error = %e, "Clarification request failed");
                return None;
            }
        };

        match completion.json::<Verdict>() {
            Ok(verdict) => {
                tracing::debug!(?stage, is_valid = verdict.is_valid, "Clarification verdict");
                Some(verdict)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable clarification verdict");
                None
            }
        }
    }

    /// Prefix for a re-prompt, when the model has a reason to give
    pub async fn clarification(&self, stage: Stage, answer: &str) -> Option<String> {
        self.verdict(stage, answer)
            .await
            .filter(|v| !v.is_valid && !v.reason.trim().is_empty())
            .map(|v| format!("Пожалуйста, уточните: {}", v.reason.trim()))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use assistant_core::{AssistantError, Completion, ModelInfo, Result};
    use async_trait::async_trait;

    use super::*;

    /// Provider that replays canned completions in order
    #[derive(Default)]
    pub struct ScriptedProvider {
        replies: Mutex<Vec<Result<String>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub fn replying(replies: Vec<Result<String>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                prompts: Mutex::default(),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "Scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        async fn complete(&self, messages: &[Message], options: &GenerationOptions) -> Result<Completion> {
            if let Some(last) = messages.last() {
                self.prompts.lock().unwrap().push(last.content.clone());
            }
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(AssistantError::ProviderUnavailable("script exhausted".into())))?;
            Ok(Completion {
                content: reply,
                model: options.model.clone(),
            })
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>> {
            Ok(Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use assistant_core::AssistantError;

    use super::testing::ScriptedProvider;
    use super::*;

    fn clarifier(replies: Vec<assistant_core::Result<String>>) -> (Arc<ScriptedProvider>, Clarifier) {
        let provider = Arc::new(ScriptedProvider::replying(replies));
        (provider.clone(), Clarifier::new(provider, "llama3.2"))
    }

    #[tokio::test]
    async fn test_verdict_from_fenced_json() {
        let (provider, clarifier) = clarifier(vec![Ok(
            "```json\n{\"is_valid\": false, \"reason\": \"это не год\", \"suggestion\": \"2012\"}\n```".into(),
        )]);

        let verdict = clarifier.verdict(Stage::Year, "вчера").await.unwrap();
        assert!(!verdict.is_valid);
        assert_eq!(verdict.suggestion, "2012");
        assert!(provider.prompts.lock().unwrap()[0].contains("'вчера'"));
    }

    #[tokio::test]
    async fn test_clarification_prefix() {
        let (_, clarifier) = clarifier(vec![Ok(r#"{"is_valid": false, "reason": "нужна сумма в день"}"#.into())]);
        assert_eq!(
            clarifier.clarification(Stage::DailyCost, "много").await.as_deref(),
            Some("Пожалуйста, уточните: нужна сумма в день")
        );
    }

    #[tokio::test]
    async fn test_no_clarification_when_valid_or_broken() {
        let (_, clarifier) = clarifier(vec![
            Ok(r#"{"is_valid": true, "reason": ""}"#.into()),
            Ok("не знаю".into()),
            Err(AssistantError::ProviderUnavailable("offline".into())),
        ]);

        assert_eq!(clarifier.clarification(Stage::Habit, "кофе").await, None);
        assert_eq!(clarifier.clarification(Stage::Habit, "?").await, None);
        assert_eq!(clarifier.clarification(Stage::Habit, "?").await, None);
    }
}
