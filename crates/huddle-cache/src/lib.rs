//! # huddle-cache
//!
//! Cross-process shared state for the realtime gateway.
//!
//! ## Features
//!
//! - **Connection Pool**: Managed Redis connection pool with deadpool
//! - **Ephemeral Sets**: TTL-bounded member sets backing presence and typing
//! - **Event Bus**: Room events fanned out to every gateway process
//!
//! Both the set store and the bus come in a Redis flavour for production and
//! an in-process flavour for single-node runs and tests.
//!
//! ## Example
//!
//! ```ignore
//! use huddle_cache::{EphemeralSetStore, RedisPool, RedisPoolConfig, RedisSetStore};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let store = RedisSetStore::new(pool.clone());
//!
//! store.add("typing:community:42", "7", Duration::from_secs(10)).await?;
//! let typing = store.members("typing:community:42").await?;
//! ```

pub mod ephemeral;
pub mod pool;
pub mod pubsub;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export ephemeral store types
pub use ephemeral::{EphemeralSetStore, MemorySetStore, RedisSetStore, StoreError, StoreResult};

// Re-export pubsub types
pub use pubsub::{
    BusError, BusResult, EventBus, LocalBus, PubSubEvent, Publisher, ReceivedMessage, RedisBus,
    RoomChannel, Subscriber, SubscriberConfig, CHANNEL_NAMESPACE, ROOM_CHANNEL_PATTERN,
    ROOM_CHANNEL_PREFIX,
};
