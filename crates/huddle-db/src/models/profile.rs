//! Identity profile database model

use sqlx::FromRow;

/// Projection of the `users` table the gateway needs
#[derive(Debug, Clone, FromRow)]
pub struct ProfileModel {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}
