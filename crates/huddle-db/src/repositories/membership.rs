//! PostgreSQL implementation of MembershipChecker

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use huddle_core::{IdentityId, MembershipChecker, RepoResult, RoomId, RoomKind};

use crate::models::MembershipRow;

use super::error::{map_db_error, room_not_found};

/// Entity table, membership table and its foreign-key column for a room kind
fn membership_tables(kind: RoomKind) -> Option<(&'static str, &'static str, &'static str)> {
    match kind {
        RoomKind::Community => Some(("communities", "community_members", "community_id")),
        RoomKind::Project => Some(("projects", "project_members", "project_id")),
        RoomKind::Challenge => Some(("challenges", "challenge_participants", "challenge_id")),
        RoomKind::Notifications => None,
    }
}

/// Membership checks against the platform's community/project/challenge tables
#[derive(Clone)]
pub struct PgMembershipChecker {
    pool: PgPool,
}

impl PgMembershipChecker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipChecker for PgMembershipChecker {
    #[instrument(skip(self, room), fields(room = %room))]
    async fn is_member(&self, identity: IdentityId, room: &RoomId) -> RepoResult<bool> {
        let Some((entity_table, member_table, fk)) = membership_tables(room.kind()) else {
            // A notification channel belongs to exactly one identity.
            return Ok(room.notification_owner() == Some(identity));
        };

        // Table names come from the fixed mapping above, never from input.
        let sql = format!(
            r"
            SELECT
                EXISTS(SELECT 1 FROM {entity_table} WHERE id = $1) AS entity_exists,
                EXISTS(SELECT 1 FROM {member_table} WHERE {fk} = $1 AND user_id = $2) AS is_member
            "
        );

        let row = sqlx::query_as::<_, MembershipRow>(&sql)
            .bind(room.entity_id())
            .bind(identity.into_inner())
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        if !row.entity_exists {
            return Err(room_not_found(*room));
        }

        Ok(row.is_member)
    }
}
