//! Notify API
//!
//! HTTP endpoints that let the rest of the application inspect connections
//! and push server-initiated messages through the registry.

use super::response::{ApiError, ApiResult};
use crate::protocol::ServerMessage;
use crate::server::GatewayState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use wshub_common::AppError;

/// Body for server-initiated messages
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyRequest {
    /// Discriminator of the outbound frame
    #[serde(rename = "type")]
    pub kind: String,
    /// Payload of the outbound frame
    #[serde(default)]
    pub data: Value,
    /// Client id to leave out (broadcast only)
    #[serde(default)]
    pub exclude: Option<String>,
}

impl NotifyRequest {
    fn into_message(self) -> ApiResult<(ServerMessage, Option<String>)> {
        if self.kind.trim().is_empty() {
            return Err(AppError::invalid_input("type must not be empty").into());
        }
        Ok((ServerMessage::new(self.kind, self.data), self.exclude))
    }
}

/// Health response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub connections: usize,
}

/// Connected clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ClientsResponse {
    pub count: usize,
    pub clients: Vec<String>,
}

/// Broadcast outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub sent: usize,
    pub failed: usize,
}

/// Direct delivery outcome
#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveryResponse {
    pub delivered: bool,
}

/// Health check
///
/// GET /health
pub async fn health_check(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        connections: state.registry().len(),
    })
}

/// List connected client ids
///
/// GET /api/clients
pub async fn list_clients(State(state): State<GatewayState>) -> Json<ClientsResponse> {
    let clients = state.registry().list_ids();
    Json(ClientsResponse {
        count: clients.len(),
        clients,
    })
}

/// Broadcast a server-initiated message
///
/// POST /api/broadcast
pub async fn broadcast(
    State(state): State<GatewayState>,
    payload: Result<Json<NotifyRequest>, JsonRejection>,
) -> ApiResult<Json<BroadcastResponse>> {
    let Json(request) = payload?;
    let (message, exclude) = request.into_message()?;

    let report = state.registry().broadcast(&message, exclude.as_deref());

    tracing::info!(
        kind = %message.kind,
        sent = report.sent,
        failed = report.failed,
        "Server broadcast"
    );

    Ok(Json(BroadcastResponse {
        sent: report.sent,
        failed: report.failed,
    }))
}

/// Send a server-initiated message to one client
///
/// POST /api/clients/:id/send
pub async fn send_to_client(
    State(state): State<GatewayState>,
    Path(client_id): Path<String>,
    payload: Result<Json<NotifyRequest>, JsonRejection>,
) -> ApiResult<Json<DeliveryResponse>> {
    let Json(request) = payload?;
    let (message, _) = request.into_message()?;

    let Some(connection) = state.registry().lookup(&client_id) else {
        return Err(ApiError::App(AppError::not_found(format!(
            "client {client_id} is not connected"
        ))));
    };

    connection.send(&message).map_err(|e| {
        tracing::warn!(client_id = %client_id, error = %e, "Server send failed");
        AppError::delivery(format!("client {client_id}: {e}"))
    })?;

    Ok(Json(DeliveryResponse { delivered: true }))
}
