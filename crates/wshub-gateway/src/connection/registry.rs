//! Connection registry
//!
//! Owns every live connection, keyed by client id, using DashMap for
//! thread-safe access. Everything outside this module refers to
//! connections by id and looks them up on use.

use super::id::generate_client_id;
use super::{Connection, Transport};
use crate::protocol::ServerMessage;
use dashmap::DashMap;
use std::sync::Arc;

/// Outcome of a broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Recipients the frame was queued for
    pub sent: usize,
    /// Recipients that were skipped because their send failed
    pub failed: usize,
}

/// Registry of all active connections
pub struct ConnectionRegistry {
    /// Active connections by client id
    connections: DashMap<String, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Create an empty registry wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a transport and return the generated client id
    pub fn register(&self, transport: Transport) -> String {
        let id = generate_client_id();
        let connection = Arc::new(Connection::new(id.clone(), transport));
        self.connections.insert(id.clone(), connection);

        tracing::debug!(client_id = %id, total = self.connections.len(), "Connection registered");

        id
    }

    /// Remove a connection; returns whether it was present
    pub fn unregister(&self, id: &str) -> bool {
        let removed = self.connections.remove(id).is_some();

        if removed {
            tracing::debug!(client_id = %id, total = self.connections.len(), "Connection unregistered");
        }

        removed
    }

    /// Look up a connection by id
    pub fn lookup(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|r| r.clone())
    }

    /// Snapshot of the current client ids
    pub fn list_ids(&self) -> Vec<String> {
        self.connections.iter().map(|r| r.key().clone()).collect()
    }

    /// Snapshot of the current connections
    pub(crate) fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections.iter().map(|r| r.value().clone()).collect()
    }

    /// Send a message to every open connection except `exclude`
    ///
    /// Failed recipients are logged and skipped.
    pub fn broadcast(&self, message: &ServerMessage, exclude: Option<&str>) -> BroadcastReport {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, kind = %message.kind, "Failed to encode broadcast");
                return BroadcastReport::default();
            }
        };

        let mut report = BroadcastReport::default();

        for entry in self.connections.iter() {
            let connection = entry.value();
            if exclude == Some(connection.id()) || !connection.is_open() {
                continue;
            }

            match connection.send_text(json.clone()) {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::debug!(
                        client_id = %connection.id(),
                        error = %e,
                        "Skipping broadcast recipient"
                    );
                }
            }
        }

        tracing::debug!(
            kind = %message.kind,
            sent = report.sent,
            failed = report.failed,
            "Message broadcast to connections"
        );

        report
    }

    /// Send a message to one connection; true if it was queued
    pub fn send_to(&self, id: &str, message: &ServerMessage) -> bool {
        let Some(connection) = self.lookup(id) else {
            tracing::trace!(client_id = %id, "send_to: no such connection");
            return false;
        };

        match connection.send(message) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(client_id = %id, error = %e, "send_to failed");
                false
            }
        }
    }

    /// Close every connection; returns how many were asked to close
    pub fn close_all(&self) -> usize {
        let connections = self.snapshot();
        for connection in &connections {
            connection.close();
        }

        if !connections.is_empty() {
            tracing::info!(count = connections.len(), "Closed all connections");
        }

        connections.len()
    }

    /// Get the number of registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("connections", &self.connections.len())
            .finish()
    }
}
