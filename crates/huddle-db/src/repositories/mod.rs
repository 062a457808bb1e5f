//! Collaborator implementations
//!
//! PostgreSQL implementations of the collaborator traits defined in huddle-core.

mod error;
mod identity;
mod membership;
mod message;
mod notification;

pub use identity::PgIdentityDirectory;
pub use membership::PgMembershipChecker;
pub use message::PgMessageWriter;
pub use notification::PgNotificationWriter;
