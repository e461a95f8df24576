//! Connection liveness
//!
//! Ping/pong probing and eviction of dead connections.

mod monitor;

pub use monitor::{LivenessMonitor, SweepReport};
