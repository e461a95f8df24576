//! Gateway state
//!
//! Application state for the gateway server.

use crate::connection::ConnectionRegistry;
use crate::liveness::LivenessMonitor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use wshub_common::AppConfig;

/// Gateway application state
///
/// Owns the connection registry and the liveness monitor watching it.
#[derive(Clone)]
pub struct GatewayState {
    /// Registry of live connections
    registry: Arc<ConnectionRegistry>,
    /// Liveness monitor for the registry
    monitor: Arc<LivenessMonitor>,
    /// Application configuration
    config: Arc<AppConfig>,
    /// Set once shutdown has run
    shut_down: Arc<AtomicBool>,
}

impl GatewayState {
    /// Create a gateway state with an empty registry and an idle monitor
    pub fn new(config: AppConfig) -> Self {
        let registry = ConnectionRegistry::new_shared();
        let monitor = Arc::new(LivenessMonitor::new(
            registry.clone(),
            config.gateway.heartbeat_interval(),
        ));

        Self {
            registry,
            monitor,
            config: Arc::new(config),
            shut_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the connection registry
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Get the liveness monitor
    pub fn monitor(&self) -> &Arc<LivenessMonitor> {
        &self.monitor
    }

    /// Get the application configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Whether shutdown has already run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Stop the liveness monitor and close every connection
    ///
    /// Only the first call has any effect.
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::info!(connections = self.registry.len(), "Shutting down gateway");

        self.monitor.stop();
        self.registry.close_all();
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("registry", &self.registry)
            .field("monitor", &self.monitor)
            .field("config", &"AppConfig")
            .finish()
    }
}
