//! Subscribe / unsubscribe handlers
//!
//! Requests are acknowledged only; no channel membership is tracked and
//! broadcasts are not filtered by channel.

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::ServerMessage;
use serde_json::Value;

/// Handles `subscribe` and `unsubscribe` messages
pub struct SubscriptionHandler;

impl SubscriptionHandler {
    /// Acknowledge a subscription request
    pub fn subscribe(connection: &Connection, channel: Value) -> HandlerResult<()> {
        tracing::debug!(client_id = %connection.id(), channel = %channel, "Subscribe requested");

        connection.send(&ServerMessage::subscribed(channel))?;
        Ok(())
    }

    /// Acknowledge an unsubscription request
    pub fn unsubscribe(connection: &Connection, channel: Value) -> HandlerResult<()> {
        tracing::debug!(client_id = %connection.id(), channel = %channel, "Unsubscribe requested");

        connection.send(&ServerMessage::unsubscribed(channel))?;
        Ok(())
    }
}
