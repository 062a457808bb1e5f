//! Domain entities - records exchanged with the durable collaborators

mod message;
mod notification;
mod profile;

pub use message::{Attachment, MessageKind, MessageRecord, NewMessage, StoredMessage};
pub use notification::{NewNotification, NotificationRecord, StoredNotification};
pub use profile::IdentityProfile;
