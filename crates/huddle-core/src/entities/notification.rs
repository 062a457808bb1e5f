//! Notification records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::IdentityId;

/// A notification to be durably written and then pushed to an identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub title: String,
    pub body: String,
    /// Free-form category, e.g. `challenge_invite` or `badge_awarded`
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Identifier and timestamp assigned by the durable write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredNotification {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// A durably written notification, as delivered to the identity's sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    #[serde(with = "super::message::id_as_string")]
    pub id: i64,
    pub identity_id: IdentityId,
    pub title: String,
    pub body: String,
    pub kind: String,
    pub data: serde_json::Value,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn from_stored(
        stored: StoredNotification,
        identity_id: IdentityId,
        notification: NewNotification,
    ) -> Self {
        Self {
            id: stored.id,
            identity_id,
            title: notification.title,
            body: notification.body,
            kind: notification.kind,
            data: notification.data,
            read: false,
            created_at: stored.created_at,
        }
    }
}
