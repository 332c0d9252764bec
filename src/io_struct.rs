use crate::error::RelayError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

pub const USAGE: &str = "POST /chat/ { prompt: <text>, model?: <model>, history?: <List[Dict]> }";
pub const HISTORY_EXAMPLE: &str = "[{\"role\":\"user\",\"content\":\"Your text here\"}]";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    /// Upstream-defined per-message fields, forwarded untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Message {
            role: role.into(),
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::new("user", content)
    }
}

/// Conversation history as sent by the caller: either a JSON-encoded string
/// or an inline array of messages.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum HistoryInput {
    Encoded(String),
    Inline(Vec<Message>),
}

impl Default for HistoryInput {
    fn default() -> Self {
        HistoryInput::Encoded("[]".to_string())
    }
}

impl HistoryInput {
    /// Decode into an ordered message list. Anything other than an array of
    /// `{role, content}` string objects is a malformed request.
    pub fn into_messages(self) -> Result<Vec<Message>, RelayError> {
        match self {
            HistoryInput::Inline(messages) => Ok(messages),
            HistoryInput::Encoded(text) => {
                serde_json::from_str::<Vec<Message>>(&text).map_err(|e| {
                    RelayError::MalformedRequest {
                        reason: format!("history is not a message array: {}", e),
                    }
                })
            }
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ChatReqInput {
    #[serde(default)]
    pub prompt: String,
    pub model: Option<String>,
    pub history: Option<HistoryInput>,
}

/// Body of the upstream chat call.
#[derive(Debug, Serialize)]
pub struct ChatPayload<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
}

#[derive(Debug)]
pub enum ChatResult {
    Success { reply: String, model: String },
    Error(RelayError),
}

impl ChatResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ChatResult::Success { .. })
    }

    pub fn status(&self) -> u16 {
        match self {
            ChatResult::Success { .. } => 200,
            ChatResult::Error(e) => e.status(),
        }
    }

    pub fn to_payload(&self) -> Value {
        match self {
            ChatResult::Success { reply, model } => json!({
                "action": "success",
                "status": 200,
                "reply": reply,
                "response": reply,
                "model": model,
            }),
            ChatResult::Error(e) => e.to_payload(),
        }
    }
}

pub fn not_found_payload(models: &[String]) -> Value {
    json!({
        "action": "error",
        "status": 404,
        "usage": USAGE,
        "models": models,
    })
}

pub fn wrong_history_payload() -> Value {
    json!({
        "action": "error",
        "status": 403,
        "response": "Wrong history syntax",
        "example": HISTORY_EXAMPLE,
    })
}
