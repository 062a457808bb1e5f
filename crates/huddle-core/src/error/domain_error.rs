//! Errors raised by the gateway's domain rules and collaborators

use thiserror::Error;

use crate::value_objects::{IdentityId, RoomId};

/// Failure of a domain rule or a collaborator call
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Identity not found: {0}")]
    IdentityNotFound(IdentityId),

    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Invalid room: {0}")]
    InvalidRoom(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Message body is empty")]
    EmptyContent,

    #[error("Not a member of {0}")]
    NotMember(RoomId),

    #[error("Room {0} has not been joined")]
    NotJoined(RoomId),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable code carried by client-facing `error` events
    pub fn code(&self) -> &'static str {
        match self {
            Self::IdentityNotFound(_) => "UNKNOWN_IDENTITY",
            Self::RoomNotFound(_) => "UNKNOWN_ROOM",

            Self::InvalidRoom(_) => "INVALID_ROOM",
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::EmptyContent => "EMPTY_CONTENT",

            Self::NotMember(_) => "NOT_A_MEMBER",
            Self::NotJoined(_) => "ROOM_NOT_JOINED",

            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IdentityNotFound(_) | Self::RoomNotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidRoom(_)
                | Self::ValidationError(_)
                | Self::ContentTooLong { .. }
                | Self::EmptyContent
        )
    }

    /// Membership failures, reported as FORBIDDEN
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotMember(_) | Self::NotJoined(_))
    }
}
