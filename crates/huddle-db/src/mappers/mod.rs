//! Model -> domain conversions

use huddle_core::{IdentityId, IdentityProfile, StoredMessage, StoredNotification};

use crate::models::{InsertedRow, ProfileModel};

impl From<ProfileModel> for IdentityProfile {
    fn from(model: ProfileModel) -> Self {
        IdentityProfile {
            id: IdentityId::new(model.id),
            username: model.username,
            display_name: model.display_name,
            avatar_url: model.avatar_url,
        }
    }
}

impl From<InsertedRow> for StoredMessage {
    fn from(row: InsertedRow) -> Self {
        StoredMessage {
            id: row.id,
            created_at: row.created_at,
        }
    }
}

impl From<InsertedRow> for StoredNotification {
    fn from(row: InsertedRow) -> Self {
        StoredNotification {
            id: row.id,
            created_at: row.created_at,
        }
    }
}
