//! # huddle-common
//!
//! Process-wide plumbing for the gateway: environment configuration, access
//! token verification, HTTP-edge errors, and the tracing subscriber.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

pub use auth::{Claims, JwtService, TokenType};
pub use config::{
    AppConfig, AppSettings, ConfigError, DatabaseConfig, Environment, GatewayConfig, JwtConfig,
    RedisConfig, ServerConfig,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{try_init_tracing_with_config, TracingConfig, TracingError};
