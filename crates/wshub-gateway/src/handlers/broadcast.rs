//! Broadcast handler

use super::HandlerResult;
use crate::connection::{Connection, ConnectionRegistry};
use crate::protocol::ServerMessage;
use serde_json::Value;

/// Handles `broadcast` messages
pub struct BroadcastHandler;

impl BroadcastHandler {
    /// Fan the payload out to every other open connection
    ///
    /// The sender gets no reply and is never told about failed recipients.
    pub fn handle(
        registry: &ConnectionRegistry,
        connection: &Connection,
        data: Value,
    ) -> HandlerResult<()> {
        let message = ServerMessage::broadcast(connection.id(), data);
        let report = registry.broadcast(&message, Some(connection.id()));

        tracing::debug!(
            client_id = %connection.id(),
            sent = report.sent,
            failed = report.failed,
            "Client broadcast delivered"
        );

        Ok(())
    }
}
