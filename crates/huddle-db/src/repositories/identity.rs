//! PostgreSQL implementation of IdentityDirectory

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use huddle_core::{IdentityDirectory, IdentityId, IdentityProfile, RepoResult};

use crate::models::ProfileModel;

use super::error::map_db_error;

/// Identity lookup against the platform's `users` table
#[derive(Clone)]
pub struct PgIdentityDirectory {
    pool: PgPool,
}

impl PgIdentityDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityDirectory for PgIdentityDirectory {
    #[instrument(skip(self))]
    async fn find_profile(&self, id: IdentityId) -> RepoResult<Option<IdentityProfile>> {
        let result = sqlx::query_as::<_, ProfileModel>(
            r"
            SELECT id, username, display_name, avatar_url
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(IdentityProfile::from))
    }
}
