//! In-process ephemeral sets for single-node deployments and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use super::{EphemeralSetStore, StoreError, StoreResult};

/// Ephemeral set store held in process memory.
///
/// Uses `tokio::time::Instant`, so expiry follows a paused test clock.
#[derive(Debug, Default)]
pub struct MemorySetStore {
    sets: DashMap<String, HashMap<String, Instant>>,
}

impl MemorySetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently holding at least one entry (live or not yet pruned)
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.sets.len()
    }
}

#[async_trait]
impl EphemeralSetStore for MemorySetStore {
    async fn add(&self, key: &str, member: &str, ttl: Duration) -> StoreResult<bool> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidTtl(ttl));
        }
        let now = Instant::now();
        let expires = now.checked_add(ttl).ok_or(StoreError::InvalidTtl(ttl))?;
        let mut set = self.sets.entry(key.to_string()).or_default();
        set.retain(|_, expires| *expires > now);
        Ok(set.insert(member.to_string(), expires).is_none())
    }

    async fn remove(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = Instant::now();
        let removed = match self.sets.get_mut(key) {
            Some(mut set) => set.remove(member).is_some_and(|expires| expires > now),
            None => return Ok(false),
        };
        self.sets.remove_if(key, |_, set| set.is_empty());
        Ok(removed)
    }

    async fn members(&self, key: &str) -> StoreResult<Vec<String>> {
        let now = Instant::now();
        let members = match self.sets.get_mut(key) {
            Some(mut set) => {
                set.retain(|_, expires| *expires > now);
                set.keys().cloned().collect()
            }
            None => return Ok(Vec::new()),
        };
        self.sets.remove_if(key, |_, set| set.is_empty());
        Ok(members)
    }
}
