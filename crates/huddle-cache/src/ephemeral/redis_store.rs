//! Redis-backed ephemeral sets.
//!
//! Each set is a sorted set whose scores are member expiry times in Unix
//! milliseconds. Expired members are pruned on every access and the key
//! itself carries a TTL so abandoned sets disappear.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::{EphemeralSetStore, StoreError, StoreResult};
use crate::pool::RedisPool;

/// Ephemeral set store backed by Redis sorted sets
#[derive(Debug, Clone)]
pub struct RedisSetStore {
    pool: RedisPool,
}

impl RedisSetStore {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn ttl_millis(ttl: Duration) -> StoreResult<i64> {
        match i64::try_from(ttl.as_millis()) {
            Ok(ms) if ms > 0 => Ok(ms),
            _ => Err(StoreError::InvalidTtl(ttl)),
        }
    }

    /// Expiry score for a member added at `now`
    fn expires_at(now: i64, ttl: Duration) -> StoreResult<i64> {
        Self::ttl_millis(ttl)?
            .checked_add(now)
            .ok_or(StoreError::InvalidTtl(ttl))
    }
}

#[async_trait]
impl EphemeralSetStore for RedisSetStore {
    async fn add(&self, key: &str, member: &str, ttl: Duration) -> StoreResult<bool> {
        let ttl_ms = Self::ttl_millis(ttl)?;
        let now = Utc::now().timestamp_millis();
        let expires_at = Self::expires_at(now, ttl)?;
        let mut conn = self.pool.get().await?;

        // Prune first so a lapsed member counts as newly added.
        let (_pruned, added, _expire): (i64, i64, i64) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(now)
            .cmd("ZADD")
            .arg(key)
            .arg(expires_at)
            .arg(member)
            .cmd("PEXPIRE")
            .arg(key)
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        tracing::trace!(key = %key, member = %member, added = added, "Ephemeral add");
        Ok(added > 0)
    }

    async fn remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = Utc::now().timestamp_millis();
        let mut conn = self.pool.get().await?;

        let (_pruned, removed): (i64, i64) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(now)
            .cmd("ZREM")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await?;

        Ok(removed > 0)
    }

    async fn members(&self, key: &str) -> StoreResult<Vec<String>> {
        let now = Utc::now().timestamp_millis();
        let mut conn = self.pool.get().await?;

        let (_pruned, members): (i64, Vec<String>) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(now)
            .cmd("ZRANGEBYSCORE")
            .arg(key)
            .arg(format!("({now}"))
            .arg("+inf")
            .query_async(&mut conn)
            .await?;

        Ok(members)
    }
}
