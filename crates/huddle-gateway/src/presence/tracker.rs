//! Presence tracker
//!
//! Keeps "who is online in room R" in the ephemeral set store so every
//! gateway process sees the same answer.
//!
//! Keys:
//! - `presence:<room>` holds the online identity ids
//! - `presence:<room>:<identity>` holds the ids of that identity's sessions in the room
//!
//! An identity leaves the room set only when its last session does, even when
//! those sessions live on different processes.

use std::sync::Arc;
use std::time::Duration;

use huddle_cache::{EphemeralSetStore, StoreResult};
use huddle_core::{IdentityId, RoomId};

/// Best-effort presence bookkeeping
///
/// Store failures never propagate: writes are logged and skipped, reads
/// report `None` ("unknown").
pub struct PresenceTracker {
    store: Arc<dyn EphemeralSetStore>,
    ttl: Duration,
}

impl PresenceTracker {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

    pub fn new(store: Arc<dyn EphemeralSetStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn room_key(room: &RoomId) -> String {
        format!("presence:{room}")
    }

    fn sessions_key(room: &RoomId, identity: IdentityId) -> String {
        format!("presence:{room}:{identity}")
    }

    /// Mark a session of `identity` present in `room`, resetting the TTL
    ///
    /// Returns `true` when the identity became newly online in the room.
    pub async fn add(&self, room: &RoomId, identity: IdentityId, session_id: &str) -> bool {
        let result: StoreResult<bool> = async {
            self.store
                .add(&Self::sessions_key(room, identity), session_id, self.ttl)
                .await?;
            self.store
                .add(&Self::room_key(room), &identity.to_string(), self.ttl)
                .await
        }
        .await;

        match result {
            Ok(newly_online) => newly_online,
            Err(e) => {
                tracing::warn!(
                    room = %room,
                    identity_id = %identity,
                    error = %e,
                    "Presence add skipped"
                );
                false
            }
        }
    }

    /// Drop a session of `identity` from `room`
    ///
    /// Returns `true` when that was the identity's last session in the room
    /// and it went offline.
    pub async fn remove(&self, room: &RoomId, identity: IdentityId, session_id: &str) -> bool {
        let sessions_key = Self::sessions_key(room, identity);
        let room_key = Self::room_key(room);
        let member = identity.to_string();

        let result: StoreResult<bool> = async {
            self.store.remove(&sessions_key, session_id).await?;
            if !self.store.members(&sessions_key).await?.is_empty() {
                return Ok(false);
            }

            let removed = self.store.remove(&room_key, &member).await?;

            // A session on another process may have joined in between.
            if !self.store.members(&sessions_key).await?.is_empty() {
                self.store.add(&room_key, &member, self.ttl).await?;
                return Ok(false);
            }
            Ok(removed)
        }
        .await;

        match result {
            Ok(went_offline) => went_offline,
            Err(e) => {
                tracing::warn!(
                    room = %room,
                    identity_id = %identity,
                    error = %e,
                    "Presence remove skipped"
                );
                false
            }
        }
    }

    /// Identities currently online in `room`, sorted; `None` when the store is unreachable
    pub async fn query(&self, room: &RoomId) -> Option<Vec<IdentityId>> {
        match self.store.members(&Self::room_key(room)).await {
            Ok(members) => {
                let mut identities: Vec<IdentityId> = members
                    .iter()
                    .filter_map(|m| IdentityId::parse(m).ok())
                    .collect();
                identities.sort_unstable();
                Some(identities)
            }
            Err(e) => {
                tracing::debug!(room = %room, error = %e, "Presence unknown");
                None
            }
        }
    }

    /// Number of identities online in `room`, when known
    pub async fn count(&self, room: &RoomId) -> Option<usize> {
        self.query(room).await.map(|identities| identities.len())
    }
}

impl std::fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}
