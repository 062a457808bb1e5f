//! Session registry
//!
//! Process-local bookkeeping of live sessions, with secondary indexes by
//! identity and by joined room. Never authoritative across processes.

use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use huddle_core::{IdentityId, RoomId};
use serde::Serialize;

use super::{Session, SessionState};

/// Result of subscribing a session to a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// The room was added to the session's joined set
    Added,
    /// The session had already joined the room
    AlreadyJoined,
    /// The session is not active (not yet ready, or torn down)
    NotActive,
}

/// Counts reported by `/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub sessions: usize,
    pub identities: usize,
    pub rooms: usize,
}

/// Manages all live sessions of this process
///
/// Uses `DashMap` for concurrent access. Room subscriptions are changed while
/// holding the session's own lock, so the room index always mirrors each
/// session's joined set.
#[derive(Default)]
pub struct SessionRegistry {
    /// Live sessions by session id
    sessions: DashMap<String, Arc<Session>>,

    /// Identity to session ids
    identity_sessions: DashMap<IdentityId, HashSet<String>>,

    /// Room to subscribed session ids
    room_sessions: DashMap<RoomId, HashSet<String>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register a freshly authenticated session
    pub fn register(&self, session: Arc<Session>) {
        let session_id = session.id().to_string();
        self.identity_sessions
            .entry(session.identity())
            .or_default()
            .insert(session_id.clone());
        self.sessions.insert(session_id.clone(), session);

        tracing::debug!(session_id = %session_id, "Session registered");
    }

    /// Remove a session, returning it and the rooms it had joined
    ///
    /// Exactly one caller gets `Some` for a given session; later or concurrent
    /// calls get `None`. The session ends up `Disconnected` with an empty
    /// joined set.
    pub fn remove(&self, session_id: &str) -> Option<(Arc<Session>, Vec<RoomId>)> {
        let (_, session) = self.sessions.remove(session_id)?;

        let rooms: Vec<RoomId> = {
            let mut inner = session.lock();
            if !inner.state.is_terminal() {
                Session::transition_locked(session_id, &mut inner, SessionState::Disconnected);
            }
            let rooms: Vec<RoomId> = inner.rooms.drain().collect();
            for room in &rooms {
                detach(&self.room_sessions, room, session_id);
            }
            rooms
        };

        detach(&self.identity_sessions, &session.identity(), session_id);

        tracing::debug!(
            session_id = %session_id,
            rooms = rooms.len(),
            "Session removed"
        );

        Some((session, rooms))
    }

    /// Add `room` to the session's joined set and the room index together
    pub fn subscribe(&self, session: &Session, room: RoomId) -> SubscribeOutcome {
        let mut inner = session.lock();
        if inner.state != SessionState::Active {
            return SubscribeOutcome::NotActive;
        }
        if !inner.rooms.insert(room) {
            return SubscribeOutcome::AlreadyJoined;
        }
        self.room_sessions
            .entry(room)
            .or_default()
            .insert(session.id().to_string());

        tracing::trace!(session_id = %session.id(), room = %room, "Session subscribed");
        SubscribeOutcome::Added
    }

    /// Remove `room` from the session's joined set and the room index together
    ///
    /// Returns whether the session had joined the room.
    pub fn unsubscribe(&self, session: &Session, room: &RoomId) -> bool {
        let mut inner = session.lock();
        let removed = inner.rooms.remove(room);
        if removed {
            detach(&self.room_sessions, room, session.id());
            tracing::trace!(session_id = %session.id(), room = %room, "Session unsubscribed");
        }
        removed
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Session>> {
        self.sessions.get(session_id).map(|r| Arc::clone(r.value()))
    }

    /// Sessions currently subscribed to a room
    pub fn room_sessions(&self, room: &RoomId) -> Vec<Arc<Session>> {
        let ids = snapshot(&self.room_sessions, room);
        self.resolve(ids)
    }

    /// Every live session of one identity
    pub fn identity_sessions(&self, identity: IdentityId) -> Vec<Arc<Session>> {
        let ids = snapshot(&self.identity_sessions, &identity);
        self.resolve(ids)
    }

    pub fn is_subscribed(&self, room: &RoomId, session_id: &str) -> bool {
        self.room_sessions
            .get(room)
            .is_some_and(|sessions| sessions.contains(session_id))
    }

    /// Ids of every live session, in no particular order
    pub fn session_ids(&self) -> Vec<String> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn identity_count(&self) -> usize {
        self.identity_sessions.len()
    }

    pub fn room_count(&self) -> usize {
        self.room_sessions.len()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            sessions: self.session_count(),
            identities: self.identity_count(),
            rooms: self.room_count(),
        }
    }

    fn resolve(&self, ids: Vec<String>) -> Vec<Arc<Session>> {
        ids.iter().filter_map(|id| self.get(id)).collect()
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Copy the ids out so no index shard stays locked while sessions are resolved
fn snapshot<K: Eq + Hash>(index: &DashMap<K, HashSet<String>>, key: &K) -> Vec<String> {
    index
        .get(key)
        .map(|ids| ids.iter().cloned().collect())
        .unwrap_or_default()
}

fn detach<K: Eq + Hash>(index: &DashMap<K, HashSet<String>>, key: &K, session_id: &str) {
    if let Some(mut ids) = index.get_mut(key) {
        ids.remove(session_id);
    }
    index.remove_if(key, |_, ids| ids.is_empty());
}
