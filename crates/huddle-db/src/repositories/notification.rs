//! PostgreSQL implementation of NotificationWriter

use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use tracing::instrument;

use huddle_core::{IdentityId, NewNotification, NotificationWriter, RepoResult, StoredNotification};

use crate::models::InsertedRow;

use super::error::map_db_error;

/// Appends notifications to the `notifications` table
#[derive(Clone)]
pub struct PgNotificationWriter {
    pool: PgPool,
}

impl PgNotificationWriter {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationWriter for PgNotificationWriter {
    #[instrument(skip(self, notification), fields(kind = %notification.kind))]
    async fn write_notification(
        &self,
        identity: IdentityId,
        notification: &NewNotification,
    ) -> RepoResult<StoredNotification> {
        let row = sqlx::query_as::<_, InsertedRow>(
            r"
            INSERT INTO notifications (user_id, title, body, kind, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at
            ",
        )
        .bind(identity.into_inner())
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.kind)
        .bind(Json(&notification.data))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(StoredNotification::from(row))
    }
}
