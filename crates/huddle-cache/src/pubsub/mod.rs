//! Redis Pub/Sub module.
//!
//! Provides publish/subscribe functionality for cross-process room events.

mod bus;
mod channels;
mod publisher;
mod subscriber;

pub use bus::{BusError, BusResult, EventBus, LocalBus, RedisBus};
pub use channels::{RoomChannel, CHANNEL_NAMESPACE, ROOM_CHANNEL_PATTERN, ROOM_CHANNEL_PREFIX};
pub use publisher::{PubSubEvent, Publisher};
pub use subscriber::{
    ReceivedMessage, Subscriber, SubscriberConfig, SubscriberError, SubscriberResult,
};
