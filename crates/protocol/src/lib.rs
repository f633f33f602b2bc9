//! Realtime chat protocol: the JSON text frames exchanged between browser
//! clients and the bridge, plus the request/reply shapes of the agent
//! backend the bridge forwards to.

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client → Bridge
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The `type` tag of a chat frame.
pub const MESSAGE_KIND: &str = "message";

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// `{ "type": "message", "content": "..." }`
    Chat { content: String },
    /// Any other well-formed tagged frame. Carried so the caller can log it.
    Other { kind: String },
}

/// Why an inbound frame was rejected.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotObject,
    #[error("frame is missing a string \"type\" field")]
    MissingType,
    #[error("\"message\" frame is missing a string \"content\" field")]
    MissingContent,
}

impl ClientMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self, FrameError> {
        let serde_json::Value::Object(frame) = serde_json::from_str::<serde_json::Value>(text)? else {
            return Err(FrameError::NotObject);
        };
        let kind = frame
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(FrameError::MissingType)?;
        if kind != MESSAGE_KIND {
            return Ok(Self::Other { kind: kind.to_string() });
        }
        let content = frame
            .get("content")
            .and_then(serde_json::Value::as_str)
            .ok_or(FrameError::MissingContent)?;
        Ok(Self::Chat {
            content: content.to_string(),
        })
    }

    /// Serialize a chat frame the way browsers send it.
    pub fn chat_frame(content: &str) -> String {
        serde_json::json!({ "type": MESSAGE_KIND, "content": content }).to_string()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bridge → Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Event envelope pushed to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Session greeting, sent once right after the upgrade.
    Connected { message: String },
    /// One reply fragment.
    Message { text: String },
    /// Human-readable failure description.
    Error { message: String },
}

impl ServerEvent {
    pub fn connected(message: impl Into<String>) -> Self {
        Self::Connected {
            message: message.into(),
        }
    }

    pub fn message(text: impl Into<String>) -> Self {
        Self::Message { text: text.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Bridge → Agent backend
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Body of `POST /{agent_id}/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMessageRequest {
    pub text: String,
    pub user_id: String,
    pub user_name: String,
}

/// One element of the backend's reply array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyFragment {
    /// Empty when the element carries no string `text`.
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: String,
    /// Everything else the agent attached (actions, attachments, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(text) => text,
        _ => String::new(),
    })
}

impl ReplyFragment {
    /// Reads one array element. Objects keep their extra keys, a bare
    /// string becomes the text, anything else is an empty fragment.
    pub fn from_item(item: serde_json::Value) -> Self {
        match item {
            serde_json::Value::Object(mut extra) => {
                let text = match extra.remove("text") {
                    Some(serde_json::Value::String(text)) => text,
                    Some(other) => {
                        extra.insert("text".into(), other);
                        String::new()
                    }
                    None => String::new(),
                };
                Self { text, extra }
            }
            serde_json::Value::String(text) => Self {
                text,
                extra: serde_json::Map::new(),
            },
            _ => Self {
                text: String::new(),
                extra: serde_json::Map::new(),
            },
        }
    }
}

/// What the backend answered, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentReply {
    /// A JSON array, one fragment per element in the order returned.
    Fragments(Vec<ReplyFragment>),
    /// A successful response that is not an array.
    Unrecognized(serde_json::Value),
}

impl AgentReply {
    /// Text sent to the client when the reply shape is not recognized.
    pub const UNEXPECTED_FORMAT: &'static str = "Agent response format was unexpected";

    pub fn from_value(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Array(items) => {
                Self::Fragments(items.into_iter().map(ReplyFragment::from_item).collect())
            }
            other => Self::Unrecognized(other),
        }
    }

    /// The client-visible texts, one per `message` event.
    pub fn texts(&self) -> Vec<String> {
        match self {
            Self::Fragments(fragments) => fragments.iter().map(|f| f.text.clone()).collect(),
            Self::Unrecognized(_) => vec![Self::UNEXPECTED_FORMAT.to_string()],
        }
    }
}
