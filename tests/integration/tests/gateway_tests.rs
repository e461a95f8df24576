//! Gateway Integration Tests
//!
//! Each test starts an in-process server on a free local port.
//!
//! Run with: cargo test -p integration-tests --test gateway_tests

use std::time::Duration;

use futures_util::StreamExt;
use integration_tests::{
    assert_json, assert_status, bare_frame, expect_silence, frame, recv_message, send_json,
    send_text, wait_for_close, BroadcastBody, ClientsBody, ErrorBody, HealthBody, NotifyBody,
    TestServer,
};
use reqwest::StatusCode;
use serde_json::json;

const QUIET: Duration = Duration::from_millis(200);

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_welcome_frame() {
    let server = TestServer::start().await.expect("Failed to start server");
    let mut ws = server.connect_raw().await.unwrap();

    let welcome = recv_message(&mut ws).await.unwrap();
    assert_eq!(welcome.kind, "connection");
    assert_eq!(welcome.data["message"], "Connected to WebSocket server");
    assert!(welcome.data["timestamp"].as_str().unwrap().ends_with('Z'));

    let id = welcome.data["clientId"].as_str().unwrap();
    assert!(server.state.registry().lookup(id).is_some());
}

#[tokio::test]
async fn test_ids_are_distinct() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_a, a) = server.connect().await.unwrap();
    let (_b, b) = server.connect().await.unwrap();

    assert_ne!(a, b);

    let mut ids = server.state.registry().list_ids();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_client_close_unregisters() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, id) = server.connect().await.unwrap();

    ws.close(None).await.unwrap();

    assert!(server.wait_until_unregistered(&id, Duration::from_secs(2)).await);
}

// ============================================================================
// Message Tests
// ============================================================================

#[tokio::test]
async fn test_ping_pong() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, _id) = server.connect().await.unwrap();

    send_json(&mut ws, &bare_frame("ping")).await.unwrap();

    let reply = recv_message(&mut ws).await.unwrap();
    assert_eq!(reply.kind, "pong");
    assert!(reply.data["timestamp"].is_string());
}

#[tokio::test]
async fn test_echo() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, _id) = server.connect().await.unwrap();

    let payload = json!({"text": "héllo", "list": [1, 2, 3], "nested": {"ok": true}});
    send_json(&mut ws, &frame("echo", payload.clone())).await.unwrap();

    let reply = recv_message(&mut ws).await.unwrap();
    assert_eq!(reply.kind, "echo");
    assert_eq!(reply.data, payload);
}

#[tokio::test]
async fn test_broadcast_excludes_sender() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut a, a_id) = server.connect().await.unwrap();
    let (mut b, _) = server.connect().await.unwrap();
    let (mut c, _) = server.connect().await.unwrap();

    send_json(&mut a, &frame("broadcast", json!({"msg": "hi"})))
        .await
        .unwrap();

    for ws in [&mut b, &mut c] {
        let received = recv_message(ws).await.unwrap();
        assert_eq!(received.kind, "broadcast");
        assert_eq!(received.data["msg"], "hi");
        assert_eq!(received.data["from"], a_id.as_str());
        assert!(received.data["timestamp"].is_string());
    }

    expect_silence(&mut a, QUIET).await.unwrap();
}

#[tokio::test]
async fn test_subscribe_acknowledged() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, _id) = server.connect().await.unwrap();

    send_json(&mut ws, &frame("subscribe", json!({"channel": "news"})))
        .await
        .unwrap();
    let ack = recv_message(&mut ws).await.unwrap();
    assert_eq!(ack.kind, "subscribed");
    assert_eq!(ack.data["channel"], "news");

    send_json(&mut ws, &frame("unsubscribe", json!({"channel": "news"})))
        .await
        .unwrap();
    let ack = recv_message(&mut ws).await.unwrap();
    assert_eq!(ack.kind, "unsubscribed");
    assert_eq!(ack.data["channel"], "news");
}

#[tokio::test]
async fn test_unknown_type() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, id) = server.connect().await.unwrap();

    send_json(&mut ws, &bare_frame("frobnicate")).await.unwrap();

    let reply = recv_message(&mut ws).await.unwrap();
    assert_eq!(reply.kind, "error");
    assert_eq!(reply.data["error"], "Unknown message type: frobnicate");
    assert!(server.state.registry().lookup(&id).is_some());
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, _id) = server.connect().await.unwrap();
    let (mut other, _) = server.connect().await.unwrap();

    send_text(&mut ws, "{not json").await.unwrap();

    let reply = recv_message(&mut ws).await.unwrap();
    assert_eq!(reply.kind, "error");
    assert_eq!(reply.data["error"], "Invalid message format");
    expect_silence(&mut other, QUIET).await.unwrap();

    // the connection keeps working afterwards
    send_json(&mut ws, &bare_frame("ping")).await.unwrap();
    assert_eq!(recv_message(&mut ws).await.unwrap().kind, "pong");
}

// ============================================================================
// Liveness Tests
// ============================================================================

#[tokio::test]
async fn test_silent_client_is_evicted() {
    let server = TestServer::start_with_heartbeat(Duration::from_millis(100))
        .await
        .expect("Failed to start server");
    let (mut ws, id) = server.connect().await.unwrap();

    // Not reading means probes go unanswered
    assert!(server.wait_until_unregistered(&id, Duration::from_secs(3)).await);

    wait_for_close(&mut ws, Duration::from_secs(2)).await.unwrap();
}

#[tokio::test]
async fn test_responsive_client_survives() {
    let server = TestServer::start_with_heartbeat(Duration::from_millis(100))
        .await
        .expect("Failed to start server");
    let (mut ws, id) = server.connect().await.unwrap();

    // Reading lets the client answer probes automatically
    let reader = tokio::spawn(async move { while let Some(Ok(_)) = ws.next().await {} });

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert!(server.state.registry().lookup(&id).is_some());

    reader.abort();
}

// ============================================================================
// Notify API Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_ws, _id) = server.connect().await.unwrap();

    let response = server.get("/health").await.expect("Request failed");
    let health: HealthBody = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(health.status, "ok");
    assert_eq!(health.connections, 1);
}

#[tokio::test]
async fn test_list_clients() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (_ws, id) = server.connect().await.unwrap();

    let response = server.get("/api/clients").await.expect("Request failed");
    let clients: ClientsBody = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(clients.count, 1);
    assert_eq!(clients.clients, vec![id]);
}

#[tokio::test]
async fn test_api_broadcast_with_exclude() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut a, a_id) = server.connect().await.unwrap();
    let (mut b, _) = server.connect().await.unwrap();

    let body = NotifyBody::new("announcement", json!({"text": "maintenance"})).excluding(&a_id);
    let response = server.post("/api/broadcast", &body).await.unwrap();
    let report: BroadcastBody = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(report.sent, 1);
    assert_eq!(report.failed, 0);

    let received = recv_message(&mut b).await.unwrap();
    assert_eq!(received.kind, "announcement");
    assert_eq!(received.data["text"], "maintenance");
    expect_silence(&mut a, QUIET).await.unwrap();
}

#[tokio::test]
async fn test_api_send_to_client() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut ws, id) = server.connect().await.unwrap();

    let body = NotifyBody::new("notice", json!({"n": 7}));
    let response = server
        .post(&format!("/api/clients/{id}/send"), &body)
        .await
        .unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();

    let received = recv_message(&mut ws).await.unwrap();
    assert_eq!(received.kind, "notice");
    assert_eq!(received.data["n"], 7);
}

#[tokio::test]
async fn test_api_send_to_unknown_client() {
    let server = TestServer::start().await.expect("Failed to start server");

    let body = NotifyBody::new("notice", json!(null));
    let response = server
        .post("/api/clients/missing/send", &body)
        .await
        .unwrap();
    let error: ErrorBody = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();

    assert_eq!(error.error.code, "NOT_FOUND");
    assert!(error.error.message.contains("missing"));
}

#[tokio::test]
async fn test_api_rejects_empty_type() {
    let server = TestServer::start().await.expect("Failed to start server");

    let body = NotifyBody::new("", json!(null));
    let response = server.post("/api/broadcast", &body).await.unwrap();
    assert_status(response, StatusCode::BAD_REQUEST).await.unwrap();
}

// ============================================================================
// Shutdown Tests
// ============================================================================

#[tokio::test]
async fn test_shutdown_closes_connections() {
    let server = TestServer::start().await.expect("Failed to start server");
    let (mut a, _) = server.connect().await.unwrap();
    let (mut b, _) = server.connect().await.unwrap();

    server.state.shutdown();
    server.state.shutdown();

    wait_for_close(&mut a, Duration::from_secs(2)).await.unwrap();
    wait_for_close(&mut b, Duration::from_secs(2)).await.unwrap();

    assert!(!server.state.monitor().is_running());
    for _ in 0..50 {
        if server.state.registry().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(server.state.registry().is_empty());
}
