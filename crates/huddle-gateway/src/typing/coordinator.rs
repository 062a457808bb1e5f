//! Typing coordinator
//!
//! Short-lived "who is typing in room R", kept in the ephemeral set store
//! under `typing:<room>`. Store expiry is the authoritative stop signal; a
//! sweeper turns locally started entries that lapse into `user_stopped_typing`
//! broadcasts so clients hear about it too.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use huddle_cache::EphemeralSetStore;
use huddle_core::{IdentityId, IdentityProfile, RoomId};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::broadcast::BroadcastDispatcher;
use crate::protocol::{IdentityInRoomPayload, IdentityRefPayload, ServerEvent};

pub struct TypingCoordinator {
    store: Arc<dyn EphemeralSetStore>,
    dispatcher: Arc<BroadcastDispatcher>,
    ttl: Duration,
    /// Deadlines of entries started through this process
    local: DashMap<(RoomId, IdentityId), Instant>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl TypingCoordinator {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(10);
    pub const SWEEP_INTERVAL: Duration = Duration::from_secs(1);

    pub fn new(
        store: Arc<dyn EphemeralSetStore>,
        dispatcher: Arc<BroadcastDispatcher>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            dispatcher,
            ttl,
            local: DashMap::new(),
            sweeper: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn key(room: &RoomId) -> String {
        format!("typing:{room}")
    }

    /// Record `identity` as typing in `room` and tell everyone else
    pub async fn start(&self, room: RoomId, identity: &IdentityProfile) {
        if let Err(e) = self
            .store
            .add(&Self::key(&room), &identity.id.to_string(), self.ttl)
            .await
        {
            tracing::warn!(
                room = %room,
                identity_id = %identity.id,
                error = %e,
                "Typing start not stored"
            );
        }
        if let Some(deadline) = Instant::now().checked_add(self.ttl) {
            self.local.insert((room, identity.id), deadline);
        }

        self.dispatcher
            .emit_excluding(
                room,
                ServerEvent::UserTyping(IdentityInRoomPayload {
                    room_id: room,
                    identity: identity.clone(),
                }),
                identity.id,
            )
            .await;
    }

    /// Explicit stop from the client; always broadcast
    pub async fn stop(&self, room: RoomId, identity: IdentityId) {
        self.local.remove(&(room, identity));
        if let Err(e) = self.store.remove(&Self::key(&room), &identity.to_string()).await {
            tracing::warn!(
                room = %room,
                identity_id = %identity,
                error = %e,
                "Typing stop not stored"
            );
        }
        self.broadcast_stopped(room, identity).await;
    }

    /// Stop on behalf of an identity that went offline; broadcast only if it was typing
    pub async fn clear(&self, room: RoomId, identity: IdentityId) {
        let was_local = self.local.remove(&(room, identity)).is_some();
        let was_stored = match self.store.remove(&Self::key(&room), &identity.to_string()).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(
                    room = %room,
                    identity_id = %identity,
                    error = %e,
                    "Typing clear not stored"
                );
                false
            }
        };

        if was_local || was_stored {
            self.broadcast_stopped(room, identity).await;
        }
    }

    /// Identities typing in `room`, sorted; `None` when the store is unreachable
    pub async fn query(&self, room: &RoomId) -> Option<Vec<IdentityId>> {
        match self.store.members(&Self::key(room)).await {
            Ok(members) => {
                let mut identities: Vec<IdentityId> = members
                    .iter()
                    .filter_map(|m| IdentityId::parse(m).ok())
                    .collect();
                identities.sort_unstable();
                Some(identities)
            }
            Err(e) => {
                tracing::debug!(room = %room, error = %e, "Typing state unknown");
                None
            }
        }
    }

    async fn broadcast_stopped(&self, room: RoomId, identity: IdentityId) {
        self.dispatcher
            .emit_excluding(
                room,
                ServerEvent::UserStoppedTyping(IdentityRefPayload {
                    room_id: room,
                    identity_id: identity,
                }),
                identity,
            )
            .await;
    }

    /// Broadcast stops for local entries whose TTL lapsed without an explicit stop
    ///
    /// Entries refreshed through another process are still in the store and
    /// are left alone. Returns the number of stops broadcast.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<(RoomId, IdentityId)> = self
            .local
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| *entry.key())
            .collect();

        let mut stopped = 0;
        for (room, identity) in expired {
            // A typing_start may have refreshed the entry since the scan.
            if self
                .local
                .remove_if(&(room, identity), |_, deadline| *deadline <= now)
                .is_none()
            {
                continue;
            }

            let still_typing = self
                .query(&room)
                .await
                .is_some_and(|typing| typing.contains(&identity));
            if still_typing {
                continue;
            }

            tracing::debug!(room = %room, identity_id = %identity, "Typing expired");
            self.broadcast_stopped(room, identity).await;
            stopped += 1;
        }
        stopped
    }

    /// Run [`sweep`](Self::sweep) every [`SWEEP_INTERVAL`](Self::SWEEP_INTERVAL)
    pub fn start_sweeper(self: &Arc<Self>) {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            tracing::warn!("Typing sweeper is already running");
            return;
        }

        let coordinator = Arc::clone(self);
        *sweeper = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Self::SWEEP_INTERVAL);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                coordinator.sweep().await;
            }
        }));
    }

    pub fn stop_sweeper(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
        }
    }
}

impl std::fmt::Debug for TypingCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingCoordinator")
            .field("ttl", &self.ttl)
            .field("local_entries", &self.local.len())
            .finish_non_exhaustive()
    }
}
