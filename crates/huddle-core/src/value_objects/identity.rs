//! Identity ID - the relational primary key of a platform user

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Identifier of an authenticated platform user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IdentityId(i64);

impl IdentityId {
    /// Create a new IdentityId from a raw i64 value
    #[inline]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    #[inline]
    pub const fn into_inner(self) -> i64 {
        self.0
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, IdentityIdParseError> {
        s.trim()
            .parse::<i64>()
            .map(IdentityId)
            .map_err(|_| IdentityIdParseError::InvalidFormat)
    }
}

/// Error when parsing an IdentityId from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdentityIdParseError {
    #[error("invalid identity id format")]
    InvalidFormat,
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for IdentityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<IdentityId> for i64 {
    fn from(id: IdentityId) -> Self {
        id.0
    }
}

impl std::str::FromStr for IdentityId {
    type Err = IdentityIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IdentityId::parse(s)
    }
}

// Serialize as string for JSON (JavaScript BigInt safety)
impl Serialize for IdentityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for IdentityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct IdentityIdVisitor;

        impl Visitor<'_> for IdentityIdVisitor {
            type Value = IdentityId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing an identity ID")
            }

            fn visit_i64<E>(self, value: i64) -> Result<IdentityId, E>
            where
                E: de::Error,
            {
                Ok(IdentityId(value))
            }

            fn visit_u64<E>(self, value: u64) -> Result<IdentityId, E>
            where
                E: de::Error,
            {
                i64::try_from(value)
                    .map(IdentityId)
                    .map_err(|_| E::custom("identity id out of range"))
            }

            fn visit_str<E>(self, value: &str) -> Result<IdentityId, E>
            where
                E: de::Error,
            {
                IdentityId::parse(value).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdentityIdVisitor)
    }
}
