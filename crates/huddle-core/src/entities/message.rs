//! Chat message records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IdentityProfile;
use crate::error::DomainError;
use crate::value_objects::RoomId;

/// Kind of chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Code,
}

impl MessageKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::File => "file",
            Self::Code => "code",
        }
    }
}

/// File or image attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// A message a client asked to send, before it is durably written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub body: String,
    pub kind: MessageKind,
    pub attachments: Vec<Attachment>,
}

impl NewMessage {
    /// Validate and normalize a client-supplied message
    ///
    /// The body is trimmed; it must be non-empty unless attachments are present,
    /// and at most `max_len` characters long.
    pub fn new(
        body: &str,
        kind: MessageKind,
        attachments: Vec<Attachment>,
        max_len: usize,
    ) -> Result<Self, DomainError> {
        let body = body.trim();

        if body.is_empty() && attachments.is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if body.chars().count() > max_len {
            return Err(DomainError::ContentTooLong { max: max_len });
        }
        if attachments.iter().any(|a| a.url.trim().is_empty()) {
            return Err(DomainError::ValidationError(
                "attachment url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            body: body.to_string(),
            kind,
            attachments,
        })
    }
}

/// Identifier and timestamp assigned by the durable write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}

/// A durably written message, as broadcast to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRecord {
    #[serde(with = "id_as_string")]
    pub id: i64,
    pub room_id: RoomId,
    pub author: IdentityProfile,
    pub body: String,
    pub kind: MessageKind,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub created_at: DateTime<Utc>,
}

impl MessageRecord {
    /// Combine the client's message with the durable id it was assigned
    pub fn from_stored(
        stored: StoredMessage,
        room_id: RoomId,
        author: IdentityProfile,
        message: NewMessage,
    ) -> Self {
        Self {
            id: stored.id,
            room_id,
            author,
            body: message.body,
            kind: message.kind,
            attachments: message.attachments,
            created_at: stored.created_at,
        }
    }
}

/// Durable ids travel as strings, like identity ids
pub(crate) mod id_as_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &i64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
