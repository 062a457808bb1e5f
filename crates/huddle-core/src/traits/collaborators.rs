//! Collaborator traits
//!
//! The realtime gateway never owns relational data. It asks these ports for
//! identity profiles and membership, and hands durable writes to them before
//! anything is broadcast. The infrastructure layer provides the implementations.

use async_trait::async_trait;

use crate::entities::{
    IdentityProfile, NewMessage, NewNotification, StoredMessage, StoredNotification,
};
use crate::error::DomainError;
use crate::value_objects::{IdentityId, RoomId};

/// Result type for collaborator operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Identity lookup
// ============================================================================

#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Resolve a verified credential subject to its profile
    async fn find_profile(&self, id: IdentityId) -> RepoResult<Option<IdentityProfile>>;
}

// ============================================================================
// Persistent membership
// ============================================================================

#[async_trait]
pub trait MembershipChecker: Send + Sync {
    /// Whether `identity` may join `room`
    ///
    /// Implementations return `DomainError::RoomNotFound` when the entity behind
    /// the room does not exist.
    async fn is_member(&self, identity: IdentityId, room: &RoomId) -> RepoResult<bool>;
}

// ============================================================================
// Durable writes
// ============================================================================

#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Durably store a chat message and return its id and timestamp
    async fn write_message(
        &self,
        room: &RoomId,
        author: IdentityId,
        message: &NewMessage,
    ) -> RepoResult<StoredMessage>;
}

#[async_trait]
pub trait NotificationWriter: Send + Sync {
    /// Durably store a notification for `identity`
    async fn write_notification(
        &self,
        identity: IdentityId,
        notification: &NewNotification,
    ) -> RepoResult<StoredNotification>;
}
