//! Frame formats
//!
//! Inbound frames decode into [`InboundMessage`]; outbound frames are
//! [`ServerMessage`] values serialized as `{ "type": ..., "data": ... }`.

use super::payloads::{
    timestamp, ChannelAckPayload, ErrorPayload, PongPayload, WelcomePayload,
};
use super::MessageType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Error text sent back for frames that cannot be decoded
pub const INVALID_FORMAT: &str = "Invalid message format";

/// Rendering of a missing discriminator in error replies
const MISSING_TYPE: &str = "undefined";

/// Frame decode failures
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not valid JSON
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is JSON but not an object
    #[error("frame is not a JSON object")]
    NotAnObject,

    /// Binary frames carry no JSON
    #[error("binary frames are not supported")]
    Binary,
}

/// A decoded client message
///
/// Known discriminators get their own variant; everything else lands in
/// `Unknown` with the raw discriminator kept for error reporting.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Ping,
    Echo { data: Value },
    Broadcast { data: Value },
    Subscribe { channel: Value },
    Unsubscribe { channel: Value },
    Unknown { kind: Option<String> },
}

impl ClientMessage {
    fn from_parts(kind: Option<&Value>, data: Value) -> Self {
        let name = match kind {
            None | Some(Value::Null) => return Self::Unknown { kind: None },
            Some(Value::String(s)) => s.clone(),
            Some(other) => {
                return Self::Unknown {
                    kind: Some(other.to_string()),
                }
            }
        };

        match MessageType::parse(&name).filter(|t| t.is_client_type()) {
            Some(MessageType::Ping) => Self::Ping,
            Some(MessageType::Echo) => Self::Echo { data },
            Some(MessageType::Broadcast) => Self::Broadcast { data },
            Some(MessageType::Subscribe) => Self::Subscribe {
                channel: channel_of(&data),
            },
            Some(MessageType::Unsubscribe) => Self::Unsubscribe {
                channel: channel_of(&data),
            },
            _ => Self::Unknown { kind: Some(name) },
        }
    }

    /// Discriminator for logging
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Ping => MessageType::Ping.as_str(),
            Self::Echo { .. } => MessageType::Echo.as_str(),
            Self::Broadcast { .. } => MessageType::Broadcast.as_str(),
            Self::Subscribe { .. } => MessageType::Subscribe.as_str(),
            Self::Unsubscribe { .. } => MessageType::Unsubscribe.as_str(),
            Self::Unknown { kind } => kind.as_deref().unwrap_or(MISSING_TYPE),
        }
    }
}

fn channel_of(data: &Value) -> Value {
    data.get("channel").cloned().unwrap_or(Value::Null)
}

/// An inbound frame after decoding
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    /// Optional client-chosen message id
    pub id: Option<String>,
    pub message: ClientMessage,
}

impl InboundMessage {
    /// Decode a text frame
    pub fn from_json(text: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Object(mut fields) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let data = fields.remove("data").unwrap_or(Value::Null);
        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .map(String::from);
        let message = ClientMessage::from_parts(fields.get("type"), data);

        Ok(Self { id, message })
    }
}

/// Outbound frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerMessage {
    /// Discriminator
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload
    pub data: Value,
}

impl ServerMessage {
    /// Create a message with an arbitrary discriminator
    #[must_use]
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
        }
    }

    fn typed(kind: MessageType, data: impl Serialize) -> Self {
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            tracing::error!(error = %e, kind = %kind, "Failed to encode payload");
            Value::Null
        });
        Self::new(kind.as_str(), data)
    }

    /// Welcome frame sent right after registration
    #[must_use]
    pub fn welcome(client_id: &str, message: &str) -> Self {
        Self::typed(MessageType::Connection, WelcomePayload::new(client_id, message))
    }

    /// Reply to an application-level ping
    #[must_use]
    pub fn pong() -> Self {
        Self::typed(MessageType::Pong, PongPayload::now())
    }

    /// Echo a payload back unchanged
    #[must_use]
    pub fn echo(data: Value) -> Self {
        Self::new(MessageType::Echo.as_str(), data)
    }

    /// Broadcast wrapper: the original object with `from` and `timestamp` merged in
    ///
    /// `null` contributes no fields; non-object payloads are kept under `data`.
    #[must_use]
    pub fn broadcast(from: &str, data: Value) -> Self {
        let mut fields = match data {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                let mut map = Map::new();
                map.insert("data".to_string(), other);
                map
            }
        };
        fields.insert("from".to_string(), Value::String(from.to_string()));
        fields.insert("timestamp".to_string(), Value::String(timestamp()));

        Self::new(MessageType::Broadcast.as_str(), Value::Object(fields))
    }

    #[must_use]
    pub fn subscribed(channel: Value) -> Self {
        Self::typed(MessageType::Subscribed, ChannelAckPayload::new(channel))
    }

    #[must_use]
    pub fn unsubscribed(channel: Value) -> Self {
        Self::typed(MessageType::Unsubscribed, ChannelAckPayload::new(channel))
    }

    /// Error frame with a message
    #[must_use]
    pub fn error(error: impl Into<String>) -> Self {
        Self::typed(MessageType::Error, ErrorPayload::new(error))
    }

    /// Error frame for undecodable input
    #[must_use]
    pub fn invalid_format() -> Self {
        Self::error(INVALID_FORMAT)
    }

    /// Error frame naming an unrecognized discriminator
    #[must_use]
    pub fn unknown_type(kind: Option<&str>) -> Self {
        Self::error(format!(
            "Unknown message type: {}",
            kind.unwrap_or(MISSING_TYPE)
        ))
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServerMessage(type={})", self.kind)
    }
}
