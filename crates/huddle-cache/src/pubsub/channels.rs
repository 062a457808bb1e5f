//! Pub/Sub channel naming.
//!
//! Every room has one Redis channel, `huddle:room:<room>`. Gateway processes
//! listen with a single pattern subscription instead of tracking rooms.

use huddle_core::RoomId;

/// Namespace shared by all gateway channels
pub const CHANNEL_NAMESPACE: &str = "huddle:";
/// Channel prefix for room events
pub const ROOM_CHANNEL_PREFIX: &str = "huddle:room:";
/// Pattern every gateway process subscribes to
pub const ROOM_CHANNEL_PATTERN: &str = "huddle:room:*";

/// Pub/Sub channel carrying the events of one room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoomChannel(RoomId);

impl RoomChannel {
    #[must_use]
    pub fn new(room: RoomId) -> Self {
        Self(room)
    }

    #[must_use]
    pub fn room(&self) -> RoomId {
        self.0
    }

    /// Get the Redis channel name
    #[must_use]
    pub fn name(&self) -> String {
        format!("{ROOM_CHANNEL_PREFIX}{}", self.0)
    }

    /// Parse a channel name back to a room channel
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        name.strip_prefix(ROOM_CHANNEL_PREFIX)
            .and_then(|room| RoomId::parse(room).ok())
            .map(Self)
    }
}

impl std::fmt::Display for RoomChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
