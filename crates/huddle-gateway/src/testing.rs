//! Stub collaborators shared by unit tests

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use huddle_cache::{EphemeralSetStore, LocalBus, MemorySetStore, StoreError, StoreResult};
use huddle_common::GatewayConfig;
use huddle_core::{
    DomainError, IdentityDirectory, IdentityId, IdentityProfile, MembershipChecker, MessageWriter,
    NewMessage, NewNotification, NotificationWriter, RepoResult, RoomId, StoredMessage,
    StoredNotification,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::protocol::Frame;
use crate::server::{Collaborators, GatewayState};
use crate::session::Session;

#[derive(Default)]
pub(crate) struct StubDirectory {
    pub profiles: Mutex<HashMap<IdentityId, IdentityProfile>>,
}

impl StubDirectory {
    pub fn with(profiles: &[IdentityProfile]) -> Self {
        let directory = Self::default();
        for profile in profiles {
            directory.profiles.lock().insert(profile.id, profile.clone());
        }
        directory
    }
}

#[async_trait]
impl IdentityDirectory for StubDirectory {
    async fn find_profile(&self, id: IdentityId) -> RepoResult<Option<IdentityProfile>> {
        Ok(self.profiles.lock().get(&id).cloned())
    }
}

/// Membership table; rooms absent from `rooms` do not exist
#[derive(Default)]
pub(crate) struct StubMembership {
    pub rooms: Mutex<HashMap<RoomId, HashSet<IdentityId>>>,
    pub delay: Option<Duration>,
    /// Limits `delay` to checks for this room
    pub delay_room: Option<RoomId>,
    pub unavailable: bool,
}

impl StubMembership {
    pub fn with_room(self, room: RoomId, members: &[i64]) -> Self {
        self.rooms
            .lock()
            .insert(room, members.iter().copied().map(IdentityId::new).collect());
        self
    }
}

#[async_trait]
impl MembershipChecker for StubMembership {
    async fn is_member(&self, identity: IdentityId, room: &RoomId) -> RepoResult<bool> {
        if let Some(delay) = self.delay {
            if self.delay_room.map_or(true, |slow| slow == *room) {
                tokio::time::sleep(delay).await;
            }
        }
        if self.unavailable {
            return Err(DomainError::DatabaseError("connection refused".to_string()));
        }
        if let Some(owner) = room.notification_owner() {
            return Ok(owner == identity);
        }
        self.rooms
            .lock()
            .get(room)
            .map(|members| members.contains(&identity))
            .ok_or(DomainError::RoomNotFound(*room))
    }
}

#[derive(Default)]
pub(crate) struct StubMessages {
    next_id: AtomicI64,
    pub fail: bool,
    pub written: Mutex<Vec<(RoomId, IdentityId, NewMessage)>>,
}

impl StubMessages {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl MessageWriter for StubMessages {
    async fn write_message(
        &self,
        room: &RoomId,
        author: IdentityId,
        message: &NewMessage,
    ) -> RepoResult<StoredMessage> {
        if self.fail {
            return Err(DomainError::DatabaseError("write timed out".to_string()));
        }
        self.written.lock().push((*room, author, message.clone()));
        Ok(StoredMessage {
            id: 1000 + self.next_id.fetch_add(1, Ordering::SeqCst),
            created_at: Utc::now(),
        })
    }
}

#[derive(Default)]
pub(crate) struct StubNotifications {
    next_id: AtomicI64,
    pub written: Mutex<Vec<(IdentityId, NewNotification)>>,
}

#[async_trait]
impl NotificationWriter for StubNotifications {
    async fn write_notification(
        &self,
        identity: IdentityId,
        notification: &NewNotification,
    ) -> RepoResult<StoredNotification> {
        self.written.lock().push((identity, notification.clone()));
        Ok(StoredNotification {
            id: 500 + self.next_id.fetch_add(1, Ordering::SeqCst),
            created_at: Utc::now(),
        })
    }
}

/// Ephemeral store whose every call fails, like an unreachable Redis
pub(crate) struct DownStore;

#[async_trait]
impl EphemeralSetStore for DownStore {
    async fn add(&self, _: &str, _: &str, _: Duration) -> StoreResult<bool> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn remove(&self, _: &str, _: &str) -> StoreResult<bool> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
    async fn members(&self, _: &str) -> StoreResult<Vec<String>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

pub(crate) const TEST_SECRET: &str = "test-secret";

pub(crate) fn profile(id: i64, username: &str) -> IdentityProfile {
    IdentityProfile::new(IdentityId::new(id), username)
}

/// Gateway state over in-process store and bus, with its dispatcher running
pub(crate) fn state_with(
    membership: StubMembership,
    messages: StubMessages,
) -> (GatewayState, Arc<MemorySetStore>) {
    build_state(StubDirectory::default(), membership, messages)
}

/// Gateway state whose directory knows `profiles`
pub(crate) fn state_with_directory(profiles: &[IdentityProfile]) -> GatewayState {
    let (state, _) = build_state(
        StubDirectory::with(profiles),
        StubMembership::default(),
        StubMessages::default(),
    );
    state
}

/// Gateway state over an arbitrary ephemeral store
pub(crate) fn state_over(
    store: Arc<dyn EphemeralSetStore>,
    membership: StubMembership,
    messages: StubMessages,
) -> GatewayState {
    assemble(StubDirectory::default(), membership, messages, store)
}

fn build_state(
    directory: StubDirectory,
    membership: StubMembership,
    messages: StubMessages,
) -> (GatewayState, Arc<MemorySetStore>) {
    let store = Arc::new(MemorySetStore::new());
    let state = assemble(directory, membership, messages, store.clone());
    (state, store)
}

fn assemble(
    directory: StubDirectory,
    membership: StubMembership,
    messages: StubMessages,
    store: Arc<dyn EphemeralSetStore>,
) -> GatewayState {
    let state = GatewayState::new(
        GatewayConfig::default(),
        huddle_common::JwtService::new(TEST_SECRET),
        Collaborators {
            directory: Arc::new(directory),
            membership: Arc::new(membership),
            messages: Arc::new(messages),
            notifications: Arc::new(StubNotifications::default()),
        },
        store,
        Arc::new(LocalBus::default()),
    );
    state.start();
    state
}

/// Register and activate a session, returning its outbound queue
pub(crate) fn connect(
    state: &GatewayState,
    profile: IdentityProfile,
) -> (Arc<Session>, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(64);
    let session = Session::new(profile, tx);
    state.registry().register(session.clone());
    session.activate();
    (session, rx)
}

/// Next frame on a session queue, failing the test after a second
pub(crate) async fn next_frame(rx: &mut mpsc::Receiver<String>) -> Frame {
    let text = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for frame")
        .expect("session queue closed");
    Frame::from_json(&text).expect("valid frame")
}

/// Next frame with the given event name, skipping others
pub(crate) async fn next_event(rx: &mut mpsc::Receiver<String>, event: &str) -> Frame {
    loop {
        let frame = next_frame(rx).await;
        if frame.event == event {
            return frame;
        }
    }
}

/// Let spawned delivery tasks run, then collect everything queued
pub(crate) async fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<Frame> {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let mut frames = Vec::new();
    while let Ok(text) = rx.try_recv() {
        if let Ok(frame) = Frame::from_json(&text) {
            frames.push(frame);
        }
    }
    frames
}
