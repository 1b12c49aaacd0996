//! # Intent Classification Feature
//!
//! Maps free-form user text onto a structured intent via the OpenAI
//! chat API. The model is instructed to answer with a single JSON
//! object; parsing failures surface as [`ClassificationError`] rather
//! than panics or retries.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;

/// Per-call ceiling on the OpenAI request.
const OPENAI_TIMEOUT: Duration = Duration::from_secs(45);

fn default_meeting_duration() -> i64 {
    60
}

/// Structured command produced by the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum StructuredIntent {
    Reminder {
        text: String,
        #[serde(default)]
        person: Option<String>,
        #[serde(default)]
        datetime: Option<String>,
        #[serde(default)]
        delay_minutes: Option<i64>,
    },
    Meeting {
        title: String,
        #[serde(default)]
        datetime: Option<String>,
        #[serde(default = "default_meeting_duration")]
        duration_minutes: i64,
        #[serde(default)]
        participants: Vec<String>,
    },
    Message {
        to: String,
        text: String,
    },
    Chat {
        reply: String,
    },
}

/// Why a classification attempt failed.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    /// The API call itself failed or timed out.
    #[error("intent service unavailable: {0}")]
    Transport(String),

    /// The model answered, but not with a usable intent payload. The
    /// raw reply is kept for logging; it is never persisted.
    #[error("unparseable intent payload: {raw}")]
    Malformed { raw: String },
}

/// Text-to-intent oracle boundary.
#[async_trait]
pub trait IntentOracle: Send + Sync {
    async fn classify(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<StructuredIntent, ClassificationError>;
}

/// Parse a model reply into an intent.
///
/// Primary strategy: the whole reply is JSON. Secondary strategy: the
/// model wrapped the object in prose, so retry on the substring between
/// the first `{` and the last `}`.
pub fn parse_intent(raw: &str) -> Result<StructuredIntent, ClassificationError> {
    let trimmed = raw.trim();
    if let Ok(intent) = serde_json::from_str::<StructuredIntent>(trimmed) {
        return Ok(intent);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            if let Ok(intent) = serde_json::from_str::<StructuredIntent>(&trimmed[start..=end]) {
                debug!("Intent recovered from embedded JSON object");
                return Ok(intent);
            }
        }
    }

    Err(ClassificationError::Malformed {
        raw: raw.to_string(),
    })
}

/// System prompt; `{time}`/`{date}` are substituted per request.
const SYSTEM_PROMPT: &str = "\
You are Jarvis, a personal assistant for a sales manager. You understand \
natural-language commands and answer ONLY with a single JSON object, no \
prose around it.

Recognize the intent:
- \"remind me\", \"reminder\", \"don't forget\" -> action \"reminder\"
- \"create a meeting\", \"schedule\", \"set up a meeting\" -> action \"meeting\"
- \"write a message\", \"send a text\" -> action \"message\"
- anything else -> action \"chat\"

For reminder answer:
{\"action\":\"reminder\",\"text\":\"reminder text\",\"person\":\"person name or null\",\"datetime\":\"YYYY-MM-DD HH:MM in UTC or null\",\"delay_minutes\":minutes from now or null}

For meeting:
{\"action\":\"meeting\",\"title\":\"meeting title\",\"datetime\":\"YYYY-MM-DD HH:MM or null\",\"duration_minutes\":number or 60,\"participants\":[\"names\"]}

For message:
{\"action\":\"message\",\"to\":\"recipient\",\"text\":\"message text\"}

For chat:
{\"action\":\"chat\",\"reply\":\"your reply\"}

Current time (UTC): {time}
Today: {date}";

/// OpenAI-backed classifier.
pub struct OpenAiOracle {
    model: String,
}

impl OpenAiOracle {
    pub fn new(model: String) -> Self {
        OpenAiOracle { model }
    }

    fn system_prompt(now: DateTime<Utc>) -> String {
        SYSTEM_PROMPT
            .replace("{time}", &now.format("%H:%M").to_string())
            .replace("{date}", &now.format("%Y-%m-%d, %A").to_string())
    }
}

#[async_trait]
impl IntentOracle for OpenAiOracle {
    async fn classify(
        &self,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<StructuredIntent, ClassificationError> {
        let messages = vec![
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::System,
                content: Some(Self::system_prompt(now)),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
            ChatCompletionMessage {
                role: ChatCompletionMessageRole::User,
                content: Some(text.to_string()),
                name: None,
                function_call: None,
                tool_call_id: None,
                tool_calls: None,
            },
        ];

        let completion = timeout(
            OPENAI_TIMEOUT,
            ChatCompletion::builder(&self.model, messages).create(),
        )
        .await
        .map_err(|_| {
            ClassificationError::Transport(format!(
                "request timed out after {}s",
                OPENAI_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| ClassificationError::Transport(e.to_string()))?;

        let reply = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Classifier reply: {} chars", reply.len());
        parse_intent(&reply).map_err(|e| {
            warn!("Classification produced unusable output");
            e
        })
    }
}
