//! Event payload structures
//!
//! Data carried in the `data` field of a frame.

use huddle_core::{
    Attachment, IdentityId, IdentityProfile, MessageKind, MessageRecord, NotificationRecord, RoomId,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Shared
// =============================================================================

/// Payload naming a single room (`join_room`, `leave_room`, `left_room`, ...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPayload {
    pub room_id: RoomId,
}

/// Availability an identity advertises to the rooms it has joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Online,
    Away,
    Busy,
    Offline,
}

// =============================================================================
// Inbound
// =============================================================================

/// `send_message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessagePayload {
    pub room_id: RoomId,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// `update_status` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: UserStatus,
}

// =============================================================================
// Outbound
// =============================================================================

/// `ready` payload, sent once after the upgrade
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub identity: IdentityProfile,
}

/// `joined_room` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinedRoomPayload {
    pub room_id: RoomId,
    /// Identities currently online; absent for notification channels or when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub online_count: Option<usize>,
}

/// `user_online` and `user_typing` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityInRoomPayload {
    pub room_id: RoomId,
    pub identity: IdentityProfile,
}

/// `user_offline` and `user_stopped_typing` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRefPayload {
    pub room_id: RoomId,
    pub identity_id: IdentityId,
}

/// `current_typing_users` and `online_users` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityListPayload {
    pub room_id: RoomId,
    pub identity_ids: Vec<IdentityId>,
}

/// `new_message` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMessagePayload {
    pub message: MessageRecord,
}

/// `status_update` payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusUpdatePayload {
    pub room_id: RoomId,
    pub identity_id: IdentityId,
    pub status: UserStatus,
}

/// `new_notification` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotificationPayload {
    pub notification: NotificationRecord,
}

/// `<kind>_update` payload (`community_update`, `project_update`, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomUpdatePayload {
    pub room_id: RoomId,
    #[serde(rename = "type")]
    pub update_type: String,
    pub payload: Value,
}

/// `error` payload, only ever sent to the session that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    /// Inbound event that failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}
