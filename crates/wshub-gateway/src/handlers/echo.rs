//! Echo handler

use super::HandlerResult;
use crate::connection::Connection;
use crate::protocol::ServerMessage;
use serde_json::Value;

/// Handles `echo` messages
pub struct EchoHandler;

impl EchoHandler {
    /// Send the payload back to the sender unchanged
    pub fn handle(connection: &Connection, data: Value) -> HandlerResult<()> {
        connection.send(&ServerMessage::echo(data))?;
        Ok(())
    }
}
