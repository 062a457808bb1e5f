//! Process configuration, read from the environment after loading `.env`.

use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Everything the gateway binary needs to start
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub env: Environment,
}

/// Deployment environment, selects the logging preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

/// Listen address of the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// PostgreSQL holding identities, memberships, and durable writes
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis backing the ephemeral sets and the cross-process bus
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    #[serde(default = "default_redis_max_connections")]
    pub max_connections: u32,
}

/// JWT verification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

/// Realtime behaviour of the gateway
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Lifetime of a presence entry after its last join
    #[serde(default = "default_presence_ttl")]
    pub presence_ttl_secs: u64,
    /// Lifetime of a typing entry after its last `typing_start`
    #[serde(default = "default_typing_ttl")]
    pub typing_ttl_secs: u64,
    /// Disconnect a session after this long without inbound traffic
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    /// Interval between server-initiated WebSocket pings
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
    /// Capacity of each session's outbound queue
    #[serde(default = "default_session_buffer")]
    pub session_buffer: usize,
    /// Maximum chat message length in characters
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl GatewayConfig {
    #[must_use]
    pub fn presence_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_ttl_secs)
    }

    #[must_use]
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_secs(self.typing_ttl_secs)
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    #[must_use]
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            presence_ttl_secs: default_presence_ttl(),
            typing_ttl_secs: default_typing_ttl(),
            idle_timeout_secs: default_idle_timeout(),
            ping_interval_secs: default_ping_interval(),
            session_buffer: default_session_buffer(),
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_app_name() -> String {
    "huddle".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_max_connections() -> u32 {
    20
}

fn default_min_connections() -> u32 {
    5
}

fn default_redis_max_connections() -> u32 {
    10
}

fn default_presence_ttl() -> u64 {
    3600 // 1 hour
}

fn default_typing_ttl() -> u64 {
    10
}

fn default_idle_timeout() -> u64 {
    90
}

fn default_ping_interval() -> u64 {
    30
}

fn default_session_buffer() -> usize {
    256
}

fn default_max_message_length() -> usize {
    4000
}

/// Read and parse an optional variable, falling back to a default
fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    default: fn() -> T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(default()),
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            app: AppSettings {
                name: env::var("APP_NAME").unwrap_or_else(|_| default_app_name()),
                env: env::var("APP_ENV")
                    .ok()
                    .and_then(|s| match s.to_lowercase().as_str() {
                        "production" => Some(Environment::Production),
                        "staging" => Some(Environment::Staging),
                        "development" => Some(Environment::Development),
                        _ => None,
                    })
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                host: env::var("GATEWAY_HOST").unwrap_or_else(|_| default_host()),
                port: env::var("GATEWAY_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .ok_or(ConfigError::MissingVar("GATEWAY_PORT"))?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", default_max_connections)?,
                min_connections: parse_or("DATABASE_MIN_CONNECTIONS", default_min_connections)?,
            },
            redis: RedisConfig {
                url: env::var("REDIS_URL").map_err(|_| ConfigError::MissingVar("REDIS_URL"))?,
                max_connections: parse_or("REDIS_MAX_CONNECTIONS", default_redis_max_connections)?,
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?,
            },
            gateway: GatewayConfig::from_env()?,
        })
    }
}

impl GatewayConfig {
    /// Load only the realtime settings; every variable is optional
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            presence_ttl_secs: parse_or("PRESENCE_TTL_SECS", default_presence_ttl)?,
            typing_ttl_secs: parse_or("TYPING_TTL_SECS", default_typing_ttl)?,
            idle_timeout_secs: parse_or("IDLE_TIMEOUT_SECS", default_idle_timeout)?,
            ping_interval_secs: parse_or("PING_INTERVAL_SECS", default_ping_interval)?,
            session_buffer: parse_or("SESSION_BUFFER", default_session_buffer)?,
            max_message_length: parse_or("MAX_MESSAGE_LENGTH", default_max_message_length)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Longest accepted presence or typing TTL (one week)
    pub const MAX_TTL_SECS: u64 = 7 * 24 * 3600;

    /// Reject values that would disable expiry or stall sessions
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, secs) in [
            ("PRESENCE_TTL_SECS", self.presence_ttl_secs),
            ("TYPING_TTL_SECS", self.typing_ttl_secs),
        ] {
            if secs == 0 || secs > Self::MAX_TTL_SECS {
                return Err(ConfigError::InvalidValue(
                    name,
                    format!("{secs} (must be between 1 and {})", Self::MAX_TTL_SECS),
                ));
            }
        }
        if self.session_buffer == 0 {
            return Err(ConfigError::InvalidValue("SESSION_BUFFER", "0".to_string()));
        }
        if self.ping_interval_secs == 0 || self.ping_interval_secs >= self.idle_timeout_secs {
            return Err(ConfigError::InvalidValue(
                "PING_INTERVAL_SECS",
                format!(
                    "{} (must be non-zero and below IDLE_TIMEOUT_SECS={})",
                    self.ping_interval_secs, self.idle_timeout_secs
                ),
            ));
        }
        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
