//! Connection management
//!
//! The registry of live WebSocket connections and their transport handles.

mod connection;
mod id;
mod registry;

pub use connection::{Connection, Liveness, OutboundFrame, OutboundQueue, SendError, Transport};
pub use id::generate_client_id;
pub use registry::{BroadcastReport, ConnectionRegistry};
