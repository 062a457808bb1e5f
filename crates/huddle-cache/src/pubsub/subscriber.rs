//! Redis Pub/Sub subscriber.
//!
//! One pattern subscription per process receives every room event, whichever
//! process published it, and rebroadcasts it in-process.

use futures_util::StreamExt;
use redis::{aio::PubSub, Client};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

use crate::pubsub::{PubSubEvent, RoomChannel, ROOM_CHANNEL_PATTERN};

/// Error type for subscriber operations
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to parse event: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Unexpected channel: {0}")]
    UnknownChannel(String),
}

/// Result type for subscriber operations
pub type SubscriberResult<T> = Result<T, SubscriberError>;

/// Event received from Pub/Sub
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub channel: RoomChannel,
    pub event: PubSubEvent,
}

impl ReceivedMessage {
    pub(crate) fn decode(channel_name: &str, payload: &str) -> SubscriberResult<Self> {
        let channel = RoomChannel::parse(channel_name)
            .ok_or_else(|| SubscriberError::UnknownChannel(channel_name.to_string()))?;
        let event = serde_json::from_str(payload)?;
        Ok(Self { channel, event })
    }
}

/// Subscriber configuration
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// Redis connection URL
    pub redis_url: String,
    /// In-process broadcast buffer; slower receivers observe a lag
    pub broadcast_buffer: usize,
    pub reconnect_delay: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broadcast_buffer: 1024,
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

/// Redis Pub/Sub subscriber
pub struct Subscriber {
    broadcast_tx: broadcast::Sender<ReceivedMessage>,
    shutdown_tx: watch::Sender<bool>,
}

impl Subscriber {
    /// Connect, subscribe and start the background listener.
    ///
    /// Fails if the first connection cannot be established; later connection
    /// losses are retried in the background.
    pub async fn new(config: SubscriberConfig) -> SubscriberResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let pubsub = Self::connect(&client).await?;

        let (broadcast_tx, _) = broadcast::channel(config.broadcast_buffer);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(Self::listener_loop(
            client,
            pubsub,
            config.reconnect_delay,
            broadcast_tx.clone(),
            shutdown_rx,
        ));

        tracing::info!(pattern = ROOM_CHANNEL_PATTERN, "Subscriber connected to Redis");

        Ok(Self {
            broadcast_tx,
            shutdown_tx,
        })
    }

    async fn connect(client: &Client) -> SubscriberResult<PubSub> {
        let mut pubsub = client.get_async_pubsub().await?;
        pubsub.psubscribe(ROOM_CHANNEL_PATTERN).await?;
        Ok(pubsub)
    }

    async fn listener_loop(
        client: Client,
        mut pubsub: PubSub,
        reconnect_delay: Duration,
        broadcast_tx: broadcast::Sender<ReceivedMessage>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            if Self::pump(&mut pubsub, &broadcast_tx, &mut shutdown_rx).await {
                tracing::info!("Subscriber shutting down");
                return;
            }

            // Events published while disconnected are lost.
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => return,
                    () = tokio::time::sleep(reconnect_delay) => {}
                }
                match Self::connect(&client).await {
                    Ok(fresh) => {
                        pubsub = fresh;
                        tracing::info!("Subscriber reconnected to Redis");
                        break;
                    }
                    Err(e) => tracing::error!(error = %e, "Subscriber reconnect failed"),
                }
            }
        }
    }

    /// Forward messages until the stream ends (`false`) or shutdown is requested (`true`)
    async fn pump(
        pubsub: &mut PubSub,
        broadcast_tx: &broadcast::Sender<ReceivedMessage>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> bool {
        let mut stream = pubsub.on_message();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => return true,
                msg = stream.next() => {
                    let Some(msg) = msg else {
                        tracing::warn!("Pub/Sub stream ended");
                        return false;
                    };

                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            tracing::warn!(error = %e, "Dropping non-string Pub/Sub payload");
                            continue;
                        }
                    };

                    match ReceivedMessage::decode(msg.get_channel_name(), &payload) {
                        Ok(received) => {
                            tracing::trace!(
                                channel = %received.channel,
                                "Received Pub/Sub message"
                            );
                            // No receivers just means no dispatcher is running yet.
                            let _ = broadcast_tx.send(received);
                        }
                        Err(e) => tracing::warn!(error = %e, "Dropping malformed Pub/Sub message"),
                    }
                }
            }
        }
    }

    /// Get a receiver for incoming events
    #[must_use]
    pub fn receiver(&self) -> broadcast::Receiver<ReceivedMessage> {
        self.broadcast_tx.subscribe()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.shutdown();
    }
}
