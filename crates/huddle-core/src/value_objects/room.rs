//! Room identifiers
//!
//! A room is not an owned object. It is a key, namespaced by kind, that every
//! gateway component uses consistently: `community:<id>`, `project:<id>`,
//! `challenge:<id>` and `notifications:<identityId>`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::IdentityId;
use crate::error::DomainError;

/// Kind of broadcast group a room belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomKind {
    Community,
    Project,
    Challenge,
    Notifications,
}

impl RoomKind {
    /// Namespace prefix used in the room key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Community => "community",
            Self::Project => "project",
            Self::Challenge => "challenge",
            Self::Notifications => "notifications",
        }
    }

    /// Whether presence and typing state is tracked for this kind of room
    #[must_use]
    pub const fn tracks_presence(self) -> bool {
        !matches!(self, Self::Notifications)
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "community" => Ok(Self::Community),
            "project" => Ok(Self::Project),
            "challenge" => Ok(Self::Challenge),
            "notifications" => Ok(Self::Notifications),
            other => Err(DomainError::InvalidRoom(format!("unknown room kind '{other}'"))),
        }
    }
}

/// Logical room identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId {
    kind: RoomKind,
    id: i64,
}

impl RoomId {
    #[must_use]
    pub const fn new(kind: RoomKind, id: i64) -> Self {
        Self { kind, id }
    }

    #[must_use]
    pub const fn community(id: i64) -> Self {
        Self::new(RoomKind::Community, id)
    }

    #[must_use]
    pub const fn project(id: i64) -> Self {
        Self::new(RoomKind::Project, id)
    }

    #[must_use]
    pub const fn challenge(id: i64) -> Self {
        Self::new(RoomKind::Challenge, id)
    }

    /// The per-identity notification channel
    #[must_use]
    pub const fn notifications(identity: IdentityId) -> Self {
        Self::new(RoomKind::Notifications, identity.into_inner())
    }

    #[must_use]
    pub const fn kind(&self) -> RoomKind {
        self.kind
    }

    /// Id of the underlying entity (community, project, challenge or identity)
    #[must_use]
    pub const fn entity_id(&self) -> i64 {
        self.id
    }

    /// Owner of a notification channel, `None` for every other kind
    #[must_use]
    pub fn notification_owner(&self) -> Option<IdentityId> {
        (self.kind == RoomKind::Notifications).then_some(IdentityId::new(self.id))
    }

    /// Parse a room key such as `community:42`
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        let (kind, id) = s.trim().split_once(':').ok_or_else(|| {
            DomainError::InvalidRoom(format!("'{s}' is not of the form <kind>:<id>"))
        })?;

        let kind = kind.parse::<RoomKind>()?;
        let id = id
            .parse::<i64>()
            .map_err(|_| DomainError::InvalidRoom(format!("'{s}' has a non-numeric id")))?;

        Ok(Self { kind, id })
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for RoomId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RoomId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
