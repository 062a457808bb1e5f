//! Redis Pub/Sub publisher.

use huddle_core::{IdentityId, RoomId};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::RoomChannel;

/// A room-scoped event as it travels between gateway processes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubSubEvent {
    pub room_id: RoomId,
    /// Outbound event name (e.g. `new_message`, `user_typing`)
    pub event_type: String,
    pub data: serde_json::Value,
    /// Sessions of this identity do not receive the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_identity: Option<IdentityId>,
}

impl PubSubEvent {
    #[must_use]
    pub fn new(room_id: RoomId, event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            room_id,
            event_type: event_type.into(),
            data,
            exclude_identity: None,
        }
    }

    #[must_use]
    pub fn excluding(mut self, identity: IdentityId) -> Self {
        self.exclude_identity = Some(identity);
        self
    }

    /// The channel this event is published on
    #[must_use]
    pub fn channel(&self) -> RoomChannel {
        RoomChannel::new(self.room_id)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Debug, Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event on its room channel, returning the number of listening processes
    pub async fn publish(&self, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = event.channel().name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::trace!(
            channel = %channel_name,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pubsub_event_creation() {
        let data = serde_json::json!({"room_id": "community:42"});
        let event = PubSubEvent::new(RoomId::community(42), "user_typing", data.clone())
            .excluding(IdentityId::new(7));

        assert_eq!(event.event_type, "user_typing");
        assert_eq!(event.data, data);
        assert_eq!(event.exclude_identity, Some(IdentityId::new(7)));
        assert_eq!(event.channel().name(), "huddle:room:community:42");
    }

    #[test]
    fn test_event_wire_format() {
        let event = PubSubEvent::new(RoomId::project(3), "left_room", serde_json::json!({}));
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""room_id":"project:3""#));
        assert!(!json.contains("exclude_identity"));

        let parsed: PubSubEvent = serde_json::from_str(
            r#"{"room_id":"project:3","event_type":"x","data":null,"exclude_identity":"5"}"#,
        )
        .unwrap();
        assert_eq!(parsed.exclude_identity, Some(IdentityId::new(5)));
    }
}
