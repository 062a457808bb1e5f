//! Gateway server setup
//!
//! Routes, dependency wiring, and the serve loop.

mod auth;
mod handler;
mod state;

pub use auth::AuthenticatedIdentity;
pub use handler::gateway_handler;
pub use state::{Collaborators, GatewayState, GatewayStats};

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use huddle_cache::{RedisBus, RedisPool, RedisSetStore};
use huddle_common::{AppConfig, AppError, JwtService};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Capacity of the in-process fan-out of bus messages
const BUS_BUFFER: usize = 1024;

/// Create the gateway router
pub fn create_router() -> Router<GatewayState> {
    Router::new()
        .route("/gateway", get(gateway_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

async fn health_check() -> &'static str {
    "OK"
}

async fn stats(State(state): State<GatewayState>) -> Json<GatewayStats> {
    Json(state.stats())
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    create_router()
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Connect to PostgreSQL and Redis and wire the gateway over them
pub async fn create_gateway_state(config: &AppConfig) -> Result<GatewayState, AppError> {
    tracing::info!("Connecting to PostgreSQL...");
    let pool = huddle_db::create_pool(&huddle_db::DatabaseConfig::from(&config.database))
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;
    tracing::info!("PostgreSQL connection established");

    tracing::info!("Connecting to Redis...");
    let redis_pool =
        RedisPool::from_config(&config.redis).map_err(|e| AppError::Cache(e.to_string()))?;
    let bus = RedisBus::connect(redis_pool.clone(), BUS_BUFFER)
        .await
        .map_err(|e| AppError::Cache(format!("Failed to start event bus: {e}")))?;
    tracing::info!("Redis connection established");

    let collaborators = Collaborators {
        directory: Arc::new(huddle_db::PgIdentityDirectory::new(pool.clone())),
        membership: Arc::new(huddle_db::PgMembershipChecker::new(pool.clone())),
        messages: Arc::new(huddle_db::PgMessageWriter::new(pool.clone())),
        notifications: Arc::new(huddle_db::PgNotificationWriter::new(pool)),
    };

    let state = GatewayState::new(
        config.gateway.clone(),
        JwtService::new(&config.jwt.secret),
        collaborators,
        Arc::new(RedisSetStore::new(redis_pool)),
        Arc::new(bus),
    );
    state.start();

    Ok(state)
}

/// Serve `app` until ctrl-c
pub async fn run_server(app: Router, listener: TcpListener) -> Result<(), AppError> {
    let addr = listener
        .local_addr()
        .map_err(|e| AppError::Config(format!("Listener has no address: {e}")))?;
    tracing::info!("Gateway listening on ws://{}/gateway", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Config(format!("Server error: {e}")))
}

/// Run the complete gateway server with configuration
pub async fn run(config: AppConfig) -> Result<(), AppError> {
    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind to {addr}: {e}")))?;

    let state = create_gateway_state(&config).await?;
    let app = create_app(state.clone());

    let result = run_server(app, listener).await;
    state.shutdown().await;
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
