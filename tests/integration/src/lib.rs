//! Integration test utilities for the WebSocket hub
//!
//! This crate provides helpers for running end-to-end tests against
//! the WebSocket endpoint and the notify API.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
