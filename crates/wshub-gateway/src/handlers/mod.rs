//! Message handlers
//!
//! Decodes inbound frames and routes them by their `type` discriminator.

mod broadcast;
mod echo;
mod error;
mod ping;
mod subscription;

pub use broadcast::BroadcastHandler;
pub use echo::EchoHandler;
pub use error::{HandlerError, HandlerResult};
pub use ping::PingHandler;
pub use subscription::SubscriptionHandler;

use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::{ClientMessage, DecodeError, InboundMessage, ServerMessage};

/// Dispatch incoming client messages to the appropriate handlers
pub struct MessageDispatcher;

impl MessageDispatcher {
    /// Decode a text frame from `client_id` and dispatch it
    ///
    /// Undecodable frames get a single error reply to the sender only.
    pub fn handle_text(
        registry: &ConnectionRegistry,
        client_id: &str,
        text: &str,
    ) -> HandlerResult<()> {
        let connection = registry
            .lookup(client_id)
            .ok_or_else(|| HandlerError::NotRegistered(client_id.to_string()))?;

        match InboundMessage::from_json(text) {
            Ok(inbound) => {
                tracing::trace!(
                    client_id = %client_id,
                    kind = %inbound.message.kind(),
                    message_id = ?inbound.id,
                    "Received message"
                );
                Self::dispatch(registry, &connection, inbound.message)
            }
            Err(e) => {
                tracing::debug!(client_id = %client_id, error = %e, "Failed to decode frame");
                connection.send(&ServerMessage::invalid_format())?;
                Ok(())
            }
        }
    }

    /// Reply to a binary frame, which this protocol does not accept
    pub fn handle_binary(registry: &ConnectionRegistry, client_id: &str) -> HandlerResult<()> {
        let connection = registry
            .lookup(client_id)
            .ok_or_else(|| HandlerError::NotRegistered(client_id.to_string()))?;

        tracing::debug!(client_id = %client_id, error = %DecodeError::Binary, "Frame rejected");
        connection.send(&ServerMessage::invalid_format())?;
        Ok(())
    }

    /// Handle a decoded client message
    pub fn dispatch(
        registry: &ConnectionRegistry,
        connection: &Connection,
        message: ClientMessage,
    ) -> HandlerResult<()> {
        match message {
            ClientMessage::Ping => PingHandler::handle(connection),
            ClientMessage::Echo { data } => EchoHandler::handle(connection, data),
            ClientMessage::Broadcast { data } => BroadcastHandler::handle(registry, connection, data),
            ClientMessage::Subscribe { channel } => SubscriptionHandler::subscribe(connection, channel),
            ClientMessage::Unsubscribe { channel } => {
                SubscriptionHandler::unsubscribe(connection, channel)
            }
            ClientMessage::Unknown { kind } => {
                tracing::debug!(
                    client_id = %connection.id(),
                    kind = ?kind,
                    "Unknown message type"
                );
                connection.send(&ServerMessage::unknown_type(kind.as_deref()))?;
                Ok(())
            }
        }
    }
}
