//! In-memory collaborators
//!
//! One [`World`] plays every relational collaborator of the gateway, so tests
//! need neither PostgreSQL nor Redis.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use huddle_core::{
    DomainError, IdentityDirectory, IdentityId, IdentityProfile, MembershipChecker, MessageWriter,
    NewMessage, NewNotification, NotificationWriter, RepoResult, RoomId, StoredMessage,
    StoredNotification,
};
use huddle_gateway::Collaborators;
use parking_lot::Mutex;

/// Identities, room memberships, and everything written durably
#[derive(Default)]
pub struct World {
    profiles: Mutex<HashMap<IdentityId, IdentityProfile>>,
    rooms: Mutex<HashMap<RoomId, HashSet<IdentityId>>>,
    messages: Mutex<Vec<(RoomId, IdentityId, NewMessage)>>,
    notifications: Mutex<Vec<(IdentityId, NewNotification)>>,
    next_id: AtomicI64,
    fail_writes: AtomicBool,
}

impl World {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_identity(&self, id: i64, username: &str) {
        let profile = IdentityProfile::new(IdentityId::new(id), username);
        self.profiles.lock().insert(profile.id, profile);
    }

    /// Create `room` with the given members
    pub fn add_room(&self, room: RoomId, members: &[i64]) {
        self.rooms
            .lock()
            .insert(room, members.iter().copied().map(IdentityId::new).collect());
    }

    /// Make every durable write fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn messages_written(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn notifications_written(&self) -> usize {
        self.notifications.lock().len()
    }

    pub fn collaborators(self: &Arc<Self>) -> Collaborators {
        Collaborators {
            directory: self.clone(),
            membership: self.clone(),
            messages: self.clone(),
            notifications: self.clone(),
        }
    }

    fn next_id(&self) -> i64 {
        1 + self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn check_writes(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::DatabaseError("database unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityDirectory for World {
    async fn find_profile(&self, id: IdentityId) -> RepoResult<Option<IdentityProfile>> {
        Ok(self.profiles.lock().get(&id).cloned())
    }
}

#[async_trait]
impl MembershipChecker for World {
    async fn is_member(&self, identity: IdentityId, room: &RoomId) -> RepoResult<bool> {
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

#[async_trait]
impl MessageWriter for World {
    async fn write_message(
        &self,
        room: &RoomId,
        author: IdentityId,
        message: &NewMessage,
    ) -> RepoResult<StoredMessage> {
        self.check_writes()?;
        self.messages.lock().push((*room, author, message.clone()));
        Ok(StoredMessage {
            id: self.next_id(),
            created_at: Utc::now(),
        })
    }
}

#[async_trait]
impl NotificationWriter for World {
    async fn write_notification(
        &self,
        identity: IdentityId,
        notification: &NewNotification,
    ) -> RepoResult<StoredNotification> {
        self.check_writes()?;
        self.notifications.lock().push((identity, notification.clone()));
        Ok(StoredNotification {
            id: self.next_id(),
            created_at: Utc::now(),
        })
    }
}
