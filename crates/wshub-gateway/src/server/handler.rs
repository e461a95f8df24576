//! WebSocket handler
//!
//! Accepts upgraded sockets, registers them, and runs their read/write loops.

use crate::connection::{ConnectionRegistry, OutboundFrame, OutboundQueue, Transport};
use crate::handlers::MessageDispatcher;
use crate::protocol::ServerMessage;
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: WebSocket) {
    let registry = state.registry().clone();

    let (transport, queue) = Transport::channel(state.config().gateway.outbound_buffer);
    let close_token = queue.close_token.clone();
    let client_id = registry.register(transport);

    tracing::info!(client_id = %client_id, "WebSocket connection established");

    // Queued before the writer starts, so it is always the first frame
    let welcome = ServerMessage::welcome(&client_id, &state.config().gateway.welcome_message);
    if !registry.send_to(&client_id, &welcome) {
        tracing::warn!(client_id = %client_id, "Failed to queue welcome message");
    }

    let (ws_sink, mut ws_stream) = socket.split();
    let writer = tokio::spawn(write_loop(client_id.clone(), ws_sink, queue));

    loop {
        tokio::select! {
            () = close_token.cancelled() => {
                tracing::debug!(client_id = %client_id, "Connection closed by server");
                break;
            }
            msg = ws_stream.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = MessageDispatcher::handle_text(&registry, &client_id, &text) {
                        tracing::warn!(client_id = %client_id, error = %e, "Handler error");
                        if e.is_disconnected() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    if let Err(e) = MessageDispatcher::handle_binary(&registry, &client_id) {
                        tracing::warn!(client_id = %client_id, error = %e, "Handler error");
                        if e.is_disconnected() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Pong(_))) => {
                    tracing::trace!(client_id = %client_id, "Probe answered");
                    if let Some(connection) = registry.lookup(&client_id) {
                        connection.record_pong();
                    }
                }
                Some(Ok(Message::Ping(_))) => {
                    // the pong reply is sent by the websocket layer
                    tracing::trace!(client_id = %client_id, "Ping received");
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!(client_id = %client_id, "Client closed connection");
                    break;
                }
                Some(Err(e)) => {
                    // Only the stream ending unregisters; an error alone does not
                    tracing::warn!(client_id = %client_id, error = %e, "WebSocket error");
                }
                None => {
                    tracing::debug!(client_id = %client_id, "WebSocket stream ended");
                    break;
                }
            }
        }
    }

    cleanup_connection(&registry, &client_id);

    if let Err(e) = writer.await {
        tracing::debug!(client_id = %client_id, error = %e, "Writer task failed");
    }
}

/// Drain the outbound queue into the socket until closed
async fn write_loop(
    client_id: String,
    mut ws_sink: SplitSink<WebSocket, Message>,
    queue: OutboundQueue,
) {
    let OutboundQueue {
        mut receiver,
        close_token,
    } = queue;

    loop {
        tokio::select! {
            biased;
            () = close_token.cancelled() => break,
            frame = receiver.recv() => {
                let message = match frame {
                    Some(OutboundFrame::Text(text)) => Message::Text(text),
                    Some(OutboundFrame::Ping) => Message::Ping(Vec::new()),
                    None => break,
                };

                if let Err(e) = ws_sink.send(message).await {
                    tracing::debug!(client_id = %client_id, error = %e, "Failed to write frame");
                    break;
                }
            }
        }
    }

    // Wake the reader if the writer stopped first
    close_token.cancel();
    let _ = ws_sink.close().await;
}

/// Remove a connection once its socket is done
fn cleanup_connection(registry: &ConnectionRegistry, client_id: &str) {
    if let Some(connection) = registry.lookup(client_id) {
        connection.close();
    }

    if registry.unregister(client_id) {
        tracing::info!(client_id = %client_id, "Connection cleaned up");
    } else {
        tracing::debug!(client_id = %client_id, "Connection already removed");
    }
}
