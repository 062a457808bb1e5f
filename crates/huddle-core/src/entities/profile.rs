//! Identity profile - the minimal snapshot attached to a session

use serde::{Deserialize, Serialize};

use crate::value_objects::IdentityId;

/// Minimal public profile of an authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityProfile {
    pub id: IdentityId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl IdentityProfile {
    /// Create a profile with only the required fields
    pub fn new(id: IdentityId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            display_name: None,
            avatar_url: None,
        }
    }

    /// Name to show in clients, falling back to the username
    pub fn visible_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}
