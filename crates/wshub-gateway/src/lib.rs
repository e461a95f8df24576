//! # wshub-gateway
//!
//! WebSocket hub: tracks live connections, relays messages between them,
//! and evicts clients that stop answering liveness probes.

pub mod connection;
pub mod handlers;
pub mod liveness;
pub mod protocol;
pub mod server;

pub use connection::{BroadcastReport, ConnectionRegistry};
pub use liveness::LivenessMonitor;
pub use server::{create_app, create_gateway_state, run, serve, GatewayState};
