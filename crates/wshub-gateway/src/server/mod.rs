//! Gateway server setup
//!
//! Provides the WebSocket route, the notify API, and the serve loop.

mod handler;
mod notify;
mod response;
mod state;

pub use handler::gateway_handler;
pub use notify::{
    BroadcastResponse, ClientsResponse, DeliveryResponse, HealthResponse, NotifyRequest,
};
pub use response::{ApiError, ApiResult};
pub use state::GatewayState;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use wshub_common::{AppConfig, AppError, CorsConfig};

/// Create the gateway router
pub fn create_router(ws_path: &str) -> Router<GatewayState> {
    Router::new()
        .route(ws_path, get(gateway_handler))
        .route("/health", get(notify::health_check))
        .route("/api/clients", get(notify::list_clients))
        .route("/api/clients/:id/send", post(notify::send_to_client))
        .route("/api/broadcast", post(notify::broadcast))
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let cors = create_cors_layer(&state.config().cors);

    create_router(&state.config().gateway.path)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Create CORS layer from configuration
///
/// No configured origins means any origin is allowed.
fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    let base_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if config.allowed_origins.is_empty() {
        return base_layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    tracing::info!("CORS: Allowing {} configured origins", origins.len());
    base_layer.allow_origin(AllowOrigin::list(origins))
}

/// Create the gateway state and start its liveness monitor
///
/// Must be called from within a tokio runtime.
pub fn create_gateway_state(config: AppConfig) -> GatewayState {
    let state = GatewayState::new(config);
    state.monitor().start();
    state
}

/// Serve the application on an already bound listener
///
/// Returns once a shutdown signal arrives and in-flight requests finish.
pub async fn serve(listener: TcpListener, state: GatewayState) -> Result<(), AppError> {
    let app = create_app(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.clone()))
        .await
        .map_err(AppError::internal)?;

    state.shutdown();
    Ok(())
}

/// Run the gateway server on `addr`
pub async fn run_server(addr: SocketAddr, state: GatewayState) -> Result<(), AppError> {
    tracing::info!("Starting Gateway server on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Server(format!("Failed to bind to {addr}: {e}")))?;

    tracing::info!(
        "Gateway listening on ws://{}{}",
        addr,
        state.config().gateway.path
    );

    serve(listener, state).await
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let address = config.server.address();
    let addr: SocketAddr = address
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid server address {address}: {e}")))?;

    let state = create_gateway_state(config);

    run_server(addr, state).await
}

/// Resolve on Ctrl-C or SIGTERM, closing every connection first
async fn shutdown_signal(state: GatewayState) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
        () = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown..."),
    }

    state.shutdown();
}
