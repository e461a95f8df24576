//! Message discriminators
//!
//! The `type` field carried by every frame in both directions.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Known message types
///
/// Some types are only valid from the client, some only from the server,
/// and `echo`/`broadcast` flow both ways.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Welcome frame sent on connect (server only)
    Connection,
    /// Application-level ping (client only)
    Ping,
    /// Reply to an application-level ping (server only)
    Pong,
    /// Payload echoed back unchanged (client/server)
    Echo,
    /// Fan-out to every other connection (client/server)
    Broadcast,
    /// Channel subscription request (client only)
    Subscribe,
    /// Channel unsubscription request (client only)
    Unsubscribe,
    /// Subscription acknowledgment (server only)
    Subscribed,
    /// Unsubscription acknowledgment (server only)
    Unsubscribed,
    /// Error report (server only)
    Error,
}

impl MessageType {
    /// Parse a wire discriminator
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "connection" => Some(Self::Connection),
            "ping" => Some(Self::Ping),
            "pong" => Some(Self::Pong),
            "echo" => Some(Self::Echo),
            "broadcast" => Some(Self::Broadcast),
            "subscribe" => Some(Self::Subscribe),
            "unsubscribe" => Some(Self::Unsubscribe),
            "subscribed" => Some(Self::Subscribed),
            "unsubscribed" => Some(Self::Unsubscribed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Echo => "echo",
            Self::Broadcast => "broadcast",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Error => "error",
        }
    }

    /// Check if a client may send this type
    #[must_use]
    pub const fn is_client_type(self) -> bool {
        matches!(
            self,
            Self::Ping | Self::Echo | Self::Broadcast | Self::Subscribe | Self::Unsubscribe
        )
    }

    /// Check if the server may send this type
    #[must_use]
    pub const fn is_server_type(self) -> bool {
        matches!(
            self,
            Self::Connection
                | Self::Pong
                | Self::Echo
                | Self::Broadcast
                | Self::Subscribed
                | Self::Unsubscribed
                | Self::Error
        )
    }
}

impl Serialize for MessageType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown message type: {value}")))
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
