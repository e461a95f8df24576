//! Test fixtures
//!
//! Client frames and notify API bodies reused across integration tests.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A `{type, data}` client frame
pub fn frame(kind: &str, data: Value) -> Value {
    json!({ "type": kind, "data": data })
}

/// A client frame without a payload
pub fn bare_frame(kind: &str) -> Value {
    json!({ "type": kind })
}

/// Notify API request body
#[derive(Debug, Serialize)]
pub struct NotifyBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

impl NotifyBody {
    pub fn new(kind: &str, data: Value) -> Self {
        Self {
            kind: kind.to_string(),
            data,
            exclude: None,
        }
    }

    pub fn excluding(mut self, id: &str) -> Self {
        self.exclude = Some(id.to_string());
        self
    }
}

/// Health response
#[derive(Debug, Deserialize)]
pub struct HealthBody {
    pub status: String,
    pub connections: usize,
}

/// Client list response
#[derive(Debug, Deserialize)]
pub struct ClientsBody {
    pub count: usize,
    pub clients: Vec<String>,
}

/// Broadcast response
#[derive(Debug, Deserialize)]
pub struct BroadcastBody {
    pub sent: usize,
    pub failed: usize,
}

/// Error response
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}
