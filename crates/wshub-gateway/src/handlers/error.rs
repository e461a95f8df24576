//! Handler error types

use crate::connection::SendError;
use thiserror::Error;

/// Handler error type
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Reply could not be queued for the sender
    #[error("Failed to reply: {0}")]
    Reply(#[from] SendError),

    /// Sender is no longer registered
    #[error("Connection {0} is not registered")]
    NotRegistered(String),
}

impl HandlerError {
    /// Whether the sender's transport is gone, so further frames are pointless
    pub fn is_disconnected(&self) -> bool {
        matches!(self, Self::Reply(SendError::Closed) | Self::NotRegistered(_))
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
