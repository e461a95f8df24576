//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers, connecting WebSocket
//! clients, and making notify API requests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use wshub_common::AppConfig;
use wshub_gateway::protocol::ServerMessage;
use wshub_gateway::{create_app, create_gateway_state, GatewayState};

/// Default wait for a single frame
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Client side of a test WebSocket
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    pub state: GatewayState,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()).await
    }

    /// Start a test server with a custom heartbeat interval
    pub async fn start_with_heartbeat(interval: Duration) -> Result<Self> {
        let mut config = test_config();
        config.gateway.heartbeat_interval_ms = u64::try_from(interval.as_millis())?;
        Self::start_with_config(config).await
    }

    /// Start a test server with custom config
    pub async fn start_with_config(config: AppConfig) -> Result<Self> {
        let state = create_gateway_state(config);
        let app = create_app(state.clone());

        // Port 0 lets the OS pick a free port
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            addr,
            client,
            state,
            handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL for the server
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.state.config().gateway.path)
    }

    /// Open a WebSocket without reading anything
    pub async fn connect_raw(&self) -> Result<WsClient> {
        let (ws, _response) = tokio_tungstenite::connect_async(self.ws_url())
            .await
            .context("WebSocket handshake failed")?;
        Ok(ws)
    }

    /// Open a WebSocket and consume its welcome frame
    ///
    /// Returns the socket and the id the server assigned to it.
    pub async fn connect(&self) -> Result<(WsClient, String)> {
        let mut ws = self.connect_raw().await?;
        let welcome = recv_message(&mut ws).await?;
        anyhow::ensure!(
            welcome.kind == "connection",
            "Expected welcome frame, got {welcome}"
        );

        let id = welcome.data["clientId"]
            .as_str()
            .context("Welcome frame without clientId")?
            .to_string();
        Ok((ws, id))
    }

    /// Wait until `id` is no longer registered
    pub async fn wait_until_unregistered(&self, id: &str, limit: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + limit;
        while tokio::time::Instant::now() < deadline {
            if self.state.registry().lookup(id).is_none() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.state.registry().lookup(id).is_none()
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.post(&url).json(body).send().await?)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.state.shutdown();
        self.handle.abort();
    }
}

/// Create a test configuration
pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Send a JSON value as a text frame
pub async fn send_json(ws: &mut WsClient, value: &serde_json::Value) -> Result<()> {
    ws.send(Message::Text(value.to_string())).await?;
    Ok(())
}

/// Send raw text as a text frame
pub async fn send_text(ws: &mut WsClient, text: &str) -> Result<()> {
    ws.send(Message::Text(text.to_string())).await?;
    Ok(())
}

/// Receive the next application frame, skipping control frames
pub async fn recv_message(ws: &mut WsClient) -> Result<ServerMessage> {
    recv_message_within(ws, RECV_TIMEOUT).await
}

/// Receive the next application frame within `limit`
pub async fn recv_message_within(ws: &mut WsClient, limit: Duration) -> Result<ServerMessage> {
    tokio::time::timeout(limit, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return Ok(ServerMessage::from_json(&text)?),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                Some(Ok(other)) => anyhow::bail!("Unexpected frame: {other:?}"),
                Some(Err(e)) => return Err(e.into()),
                None => anyhow::bail!("Socket closed"),
            }
        }
    })
    .await
    .context("Timed out waiting for a frame")?
}

/// Assert that no application frame arrives within `limit`
pub async fn expect_silence(ws: &mut WsClient, limit: Duration) -> Result<()> {
    match recv_message_within(ws, limit).await {
        Ok(message) => anyhow::bail!("Expected no frame, got {message}"),
        Err(_) => Ok(()),
    }
}

/// Wait for the server to close the socket
pub async fn wait_for_close(ws: &mut WsClient, limit: Duration) -> Result<()> {
    tokio::time::timeout(limit, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_)) | Err(_)) | None => return,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .context("Socket was not closed")
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
