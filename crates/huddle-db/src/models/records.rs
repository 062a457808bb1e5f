//! Rows returned by membership checks and durable inserts

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Result of a membership probe
#[derive(Debug, Clone, Copy, FromRow)]
pub struct MembershipRow {
    /// The community, project or challenge exists
    pub entity_exists: bool,
    pub is_member: bool,
}

/// Key and timestamp assigned by an `INSERT ... RETURNING`
#[derive(Debug, Clone, Copy, FromRow)]
pub struct InsertedRow {
    pub id: i64,
    pub created_at: DateTime<Utc>,
}
