//! Server payload definitions
//!
//! Structures serialized into the `data` field of outbound frames.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Current time as an ISO-8601 UTC string with millisecond precision
#[must_use]
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Payload for the `connection` welcome frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomePayload {
    /// Id assigned to the new connection
    pub client_id: String,
    /// Human readable greeting
    pub message: String,
    pub timestamp: String,
}

impl WelcomePayload {
    #[must_use]
    pub fn new(client_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            message: message.into(),
            timestamp: timestamp(),
        }
    }
}

/// Payload for `pong`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PongPayload {
    pub timestamp: String,
}

impl PongPayload {
    #[must_use]
    pub fn now() -> Self {
        Self {
            timestamp: timestamp(),
        }
    }
}

/// Payload for `subscribed` / `unsubscribed`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAckPayload {
    /// Channel exactly as the client requested it (`null` when absent)
    pub channel: Value,
    pub timestamp: String,
}

impl ChannelAckPayload {
    #[must_use]
    pub fn new(channel: Value) -> Self {
        Self {
            channel,
            timestamp: timestamp(),
        }
    }
}

/// Payload for `error`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub timestamp: String,
}

impl ErrorPayload {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            timestamp: timestamp(),
        }
    }
}
