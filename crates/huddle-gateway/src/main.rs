//! Huddle gateway entry point
//!
//! Run with:
//! ```bash
//! cargo run -p huddle-gateway
//! ```
//!
//! Configuration is loaded from environment variables.

use huddle_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Tracing depends on APP_ENV, so configuration comes first
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        address = %config.server.address(),
        presence_ttl_secs = config.gateway.presence_ttl_secs,
        typing_ttl_secs = config.gateway.typing_ttl_secs,
        "Starting Huddle Gateway"
    );

    if let Err(e) = huddle_gateway::run(config).await {
        error!(error = %e, "Gateway failed");
        std::process::exit(1);
    }
}
