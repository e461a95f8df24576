//! Application-level ping handler

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::ServerMessage;

/// Handles `ping` messages
pub struct PingHandler;

impl PingHandler {
    /// Reply with a timestamped `pong`
    pub fn handle(connection: &Connection) -> HandlerResult<()> {
        tracing::trace!(client_id = %connection.id(), "Ping received");

        connection.send(&ServerMessage::pong())?;
        Ok(())
    }
}
