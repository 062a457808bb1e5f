//! Error handling utilities for repositories

use huddle_core::{DomainError, RoomId};
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    tracing::warn!(error = %e, "Database operation failed");
    DomainError::DatabaseError(e.to_string())
}

/// Create a "room not found" error
pub fn room_not_found(room: RoomId) -> DomainError {
    DomainError::RoomNotFound(room)
}
