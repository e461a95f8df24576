//! WebSocket hub server entry point
//!
//! Run with:
//! ```bash
//! cargo run -p wshub-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use tracing::{error, info};
use wshub_common::{try_init_tracing_with_config, AppConfig, TracingConfig};

#[tokio::main]
async fn main() {
    // Load configuration before tracing so the log format can follow it
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_app(&config.app)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        name = %config.app.name,
        env = ?config.app.env,
        address = %config.server.address(),
        path = %config.gateway.path,
        "Configuration loaded"
    );

    wshub_gateway::run(config).await?;

    info!("Gateway stopped");
    Ok(())
}
