//! PostgreSQL implementation of MessageWriter

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tracing::instrument;

use huddle_core::{IdentityId, MessageWriter, NewMessage, RepoResult, RoomId, StoredMessage};

use crate::models::InsertedRow;

use super::error::map_db_error;

/// Appends chat messages to `room_messages`
#[derive(Clone)]
pub struct PgMessageWriter {
    pool: PgPool,
}

impl PgMessageWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageWriter for PgMessageWriter {
    #[instrument(skip(self, room, message), fields(room = %room))]
    async fn write_message(
        &self,
        room: &RoomId,
        author: IdentityId,
        message: &NewMessage,
    ) -> RepoResult<StoredMessage> {
        let row = sqlx::query_as::<_, InsertedRow>(
            r"
            INSERT INTO room_messages (room_kind, room_ref, author_id, body, kind, attachments)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            ",
        )
        .bind(room.kind().as_str())
        .bind(room.entity_id())
        .bind(author.into_inner())
        .bind(&message.body)
        .bind(message.kind.as_str())
        .bind(Json(&message.attachments))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(StoredMessage::from(row))
    }
}
