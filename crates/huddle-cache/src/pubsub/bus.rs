//! Event bus abstraction over Pub/Sub.
//!
//! Publishers hand room events to the bus; each gateway process reads every
//! event back from its receiver and delivers it to its own sessions.

use async_trait::async_trait;
use tokio::sync::broadcast;

use super::{PubSubEvent, Publisher, ReceivedMessage, Subscriber, SubscriberConfig, SubscriberError};
use crate::pool::{RedisPool, RedisPoolError};

/// Error type for event bus operations
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("Publish failed: {0}")]
    Publish(#[from] RedisPoolError),

    #[error("Subscribe failed: {0}")]
    Subscribe(#[from] SubscriberError),
}

/// Result type for event bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Distributed publish mechanism used by the broadcast dispatcher
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publish an event. Returning does not imply anyone received it.
    async fn publish(&self, event: PubSubEvent) -> BusResult<()>;

    /// A fresh receiver of every event published on the bus from now on
    fn subscribe(&self) -> broadcast::Receiver<ReceivedMessage>;
}

/// Bus confined to the current process
#[derive(Debug, Clone)]
pub struct LocalBus {
    tx: broadcast::Sender<ReceivedMessage>,
}

impl LocalBus {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }
}

impl Default for LocalBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl EventBus for LocalBus {
    async fn publish(&self, event: PubSubEvent) -> BusResult<()> {
        let received = ReceivedMessage {
            channel: event.channel(),
            event,
        };
        // Without receivers the event is dropped, same as Redis.
        let _ = self.tx.send(received);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.tx.subscribe()
    }
}

/// Bus spanning every process connected to the same Redis
pub struct RedisBus {
    publisher: Publisher,
    subscriber: Subscriber,
}

impl RedisBus {
    pub async fn connect(pool: RedisPool, broadcast_buffer: usize) -> BusResult<Self> {
        let config = SubscriberConfig {
            redis_url: pool.url().to_string(),
            broadcast_buffer,
            ..SubscriberConfig::default()
        };
        let subscriber = Subscriber::new(config).await?;
        Ok(Self {
            publisher: Publisher::new(pool),
            subscriber,
        })
    }
}

impl std::fmt::Debug for RedisBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBus")
            .field("publisher", &self.publisher)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventBus for RedisBus {
    async fn publish(&self, event: PubSubEvent) -> BusResult<()> {
        self.publisher.publish(&event).await?;
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.subscriber.receiver()
    }
}
