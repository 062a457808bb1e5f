//! # huddle-db
//!
//! PostgreSQL implementations of the collaborator traits defined in `huddle-core`.
//!
//! ## Overview
//!
//! The realtime gateway never owns relational data. It reads identities and
//! memberships that the platform's API service maintains, and appends chat
//! messages and notifications before they are broadcast.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use huddle_db::{create_pool, DatabaseConfig, PgMembershipChecker};
//! use huddle_core::{MembershipChecker, RoomId};
//!
//! let pool = create_pool(&DatabaseConfig::from(&app_config.database)).await?;
//! let membership = PgMembershipChecker::new(pool);
//! let allowed = membership.is_member(identity, &RoomId::community(42)).await?;
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, DatabaseConfig, PgPool};
pub use repositories::{
    PgIdentityDirectory, PgMembershipChecker, PgMessageWriter, PgNotificationWriter,
};
