//! Ephemeral set store.
//!
//! A key names a set of string members; every member carries its own expiry.
//! Presence and typing state is kept here so it is shared by every gateway
//! process and cleaned up by expiry when a process dies.

mod memory_store;
mod redis_store;

use async_trait::async_trait;
use std::time::Duration;

pub use memory_store::MemorySetStore;
pub use redis_store::RedisSetStore;

use crate::pool::RedisPoolError;

/// Error type for ephemeral store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid TTL: {0:?}")]
    InvalidTtl(Duration),
}

impl From<RedisPoolError> for StoreError {
    fn from(err: RedisPoolError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Result type for ephemeral store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// TTL-keyed set operations
#[async_trait]
pub trait EphemeralSetStore: Send + Sync {
    /// Insert `member` or reset its expiry to `ttl` from now.
    ///
    /// Returns `true` when the member was not present (or had already expired).
    async fn add(&self, key: &str, member: &str, ttl: Duration) -> StoreResult<bool>;

    /// Remove `member`. Returns `true` when a live member was removed.
    async fn remove(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Live (non-expired) members of the set, in no particular order.
    async fn members(&self, key: &str) -> StoreResult<Vec<String>>;
}
