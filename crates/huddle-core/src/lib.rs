//! # huddle-core
//!
//! Domain layer containing identities, rooms, durable record types, and the
//! collaborator traits the realtime gateway depends on.
//! This crate has zero dependencies on infrastructure (database, cache, web framework).

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Attachment, IdentityProfile, MessageKind, MessageRecord, NewMessage, NewNotification,
    NotificationRecord, StoredMessage, StoredNotification,
};
pub use error::DomainError;
pub use traits::{
    IdentityDirectory, MembershipChecker, MessageWriter, NotificationWriter, RepoResult,
};
pub use value_objects::{IdentityId, IdentityIdParseError, RoomId, RoomKind};
