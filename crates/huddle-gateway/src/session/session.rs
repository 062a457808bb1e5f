//! A single authenticated WebSocket session
//!
//! Holds the identity snapshot taken at handshake time, the joined-room set,
//! and the outbound queue drained by the connection's send task.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use huddle_core::{IdentityId, IdentityProfile, RoomId};
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::protocol::{ServerEvent, UserStatus};

/// Session lifecycle
///
/// `Connecting` covers the upgrade handshake; a [`Session`] value only exists
/// from `Authenticated` on. `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Handshake in progress, credential not yet verified
    Connecting,
    /// Credential verified, session registered, `ready` not yet delivered
    Authenticated,
    /// Accepting room operations
    Active,
    /// Torn down
    Disconnected,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Authenticated | Self::Disconnected)
                | (Self::Authenticated, Self::Active | Self::Disconnected)
                | (Self::Active, Self::Disconnected)
        )
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connecting => "connecting",
            Self::Authenticated => "authenticated",
            Self::Active => "active",
            Self::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// Mutable session state guarded by one lock
///
/// The registry updates `rooms` together with its room index while holding
/// this lock, so joins never race teardown.
#[derive(Debug)]
pub(crate) struct SessionInner {
    pub(crate) state: SessionState,
    pub(crate) rooms: HashSet<RoomId>,
    pub(crate) status: UserStatus,
    pub(crate) last_activity: Instant,
}

/// A single authenticated connection
pub struct Session {
    id: String,
    profile: IdentityProfile,
    inner: Mutex<SessionInner>,
    sender: mpsc::Sender<String>,
    torn_down: AtomicBool,
    created_at: Instant,
}

impl Session {
    /// Create a session for a verified identity, with a fresh id
    pub fn new(profile: IdentityProfile, sender: mpsc::Sender<String>) -> Arc<Self> {
        Self::with_id(uuid::Uuid::new_v4().to_string(), profile, sender)
    }

    pub fn with_id(
        id: impl Into<String>,
        profile: IdentityProfile,
        sender: mpsc::Sender<String>,
    ) -> Arc<Self> {
        let now = Instant::now();
        Arc::new(Self {
            id: id.into(),
            profile,
            inner: Mutex::new(SessionInner {
                state: SessionState::Authenticated,
                rooms: HashSet::new(),
                status: UserStatus::Online,
                last_activity: now,
            }),
            sender,
            torn_down: AtomicBool::new(false),
            created_at: now,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn identity(&self) -> IdentityId {
        self.profile.id
    }

    /// Profile snapshot taken at handshake time
    pub fn profile(&self) -> &IdentityProfile {
        &self.profile
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// Move to `next` if the transition is legal
    pub fn transition(&self, next: SessionState) -> bool {
        let mut inner = self.inner.lock();
        Self::transition_locked(&self.id, &mut inner, next)
    }

    pub(crate) fn transition_locked(
        id: &str,
        inner: &mut SessionInner,
        next: SessionState,
    ) -> bool {
        if inner.state.can_transition_to(next) {
            tracing::trace!(
                session_id = %id,
                from = %inner.state,
                to = %next,
                "Session state change"
            );
            inner.state = next;
            true
        } else {
            tracing::warn!(
                session_id = %id,
                from = %inner.state,
                to = %next,
                "Refused illegal session state transition"
            );
            false
        }
    }

    /// `Authenticated` → `Active`, once `ready` has been queued
    pub fn activate(&self) -> bool {
        self.transition(SessionState::Active)
    }

    pub fn is_active(&self) -> bool {
        self.state() == SessionState::Active
    }

    /// Joined rooms, in no particular order
    pub fn rooms(&self) -> Vec<RoomId> {
        self.inner.lock().rooms.iter().copied().collect()
    }

    pub fn has_joined(&self, room: &RoomId) -> bool {
        self.inner.lock().rooms.contains(room)
    }

    pub fn status(&self) -> UserStatus {
        self.inner.lock().status
    }

    pub fn set_status(&self, status: UserStatus) {
        self.inner.lock().status = status;
    }

    /// Record inbound traffic
    pub fn touch(&self) {
        self.inner.lock().last_activity = Instant::now();
    }

    /// Time since the last inbound frame
    pub fn idle_for(&self) -> Duration {
        self.inner.lock().last_activity.elapsed()
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock()
    }

    /// Claim teardown; only the first caller gets `true`
    pub fn mark_torn_down(&self) -> bool {
        !self.torn_down.swap(true, Ordering::AcqRel)
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Queue an event for this session without waiting
    ///
    /// Returns `false` when the event was dropped (queue full or closed).
    pub fn send(&self, event: &ServerEvent) -> bool {
        match event.to_json() {
            Ok(text) => self.send_text(text),
            Err(e) => {
                tracing::error!(
                    session_id = %self.id,
                    event = event.name(),
                    error = %e,
                    "Failed to serialize event"
                );
                false
            }
        }
    }

    /// Queue pre-serialized frame text without waiting
    pub fn send_text(&self, text: String) -> bool {
        match self.sender.try_send(text) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "Outbound queue full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session_id = %self.id, "Outbound queue closed, dropping event");
                false
            }
        }
    }

    /// Whether the send task has gone away
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("identity", &self.profile.id)
            .field("state", &self.state())
            .field("torn_down", &self.is_torn_down())
            .finish_non_exhaustive()
    }
}
