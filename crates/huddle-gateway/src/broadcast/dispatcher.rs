//! Broadcast dispatcher
//!
//! Publishes room events on the event bus and delivers every event read back
//! from the bus to the local sessions subscribed to its room.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use huddle_cache::{EventBus, PubSubEvent, ReceivedMessage};
use huddle_core::{
    IdentityId, NewNotification, NotificationRecord, NotificationWriter, RoomId, RoomKind,
};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::handlers::{GatewayError, HandlerResult};
use crate::protocol::{Frame, NewNotificationPayload, RoomUpdatePayload, ServerEvent};
use crate::session::SessionRegistry;

/// Delivery counters reported by `/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DispatchStats {
    pub delivered: u64,
    pub dropped: u64,
}

/// Fans room events out to sessions, on this process and every other one
/// sharing the bus
///
/// Delivery is at-most-once: a session whose queue is full or closed misses
/// the event, and an event for a room with no local subscribers is dropped.
pub struct BroadcastDispatcher {
    bus: Arc<dyn EventBus>,
    registry: Arc<SessionRegistry>,
    notifications: Arc<dyn NotificationWriter>,
    running: AtomicBool,
    task: Mutex<Option<JoinHandle<()>>>,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl BroadcastDispatcher {
    pub fn new(
        bus: Arc<dyn EventBus>,
        registry: Arc<SessionRegistry>,
        notifications: Arc<dyn NotificationWriter>,
    ) -> Self {
        Self {
            bus,
            registry,
            notifications,
            running: AtomicBool::new(false),
            task: Mutex::new(None),
            delivered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Deliver `event` to every session subscribed to `room`
    pub async fn emit(&self, room: RoomId, event: ServerEvent) {
        self.emit_inner(room, event, None).await;
    }

    /// Deliver `event` to every session subscribed to `room`, except those of `identity`
    pub async fn emit_excluding(&self, room: RoomId, event: ServerEvent, identity: IdentityId) {
        self.emit_inner(room, event, Some(identity)).await;
    }

    /// Deliver `event` to every session of `identity` subscribed to its notification channel
    pub async fn emit_to_identity(&self, identity: IdentityId, event: ServerEvent) {
        self.emit_inner(RoomId::notifications(identity), event, None)
            .await;
    }

    /// Durably write a notification, then push it to the identity's sessions
    ///
    /// Nothing is emitted when the write fails.
    pub async fn notify(
        &self,
        identity: IdentityId,
        notification: NewNotification,
    ) -> HandlerResult<NotificationRecord> {
        let stored = self
            .notifications
            .write_notification(identity, &notification)
            .await
            .map_err(GatewayError::from)?;

        let record = NotificationRecord::from_stored(stored, identity, notification);
        self.emit_to_identity(
            identity,
            ServerEvent::NewNotification(NewNotificationPayload {
                notification: record.clone(),
            }),
        )
        .await;

        Ok(record)
    }

    /// Emit `<kind>_update` (e.g. `project_update`) to a room
    pub async fn publish_room_update(
        &self,
        room: RoomId,
        update_type: impl Into<String>,
        payload: serde_json::Value,
    ) -> HandlerResult<()> {
        if room.kind() == RoomKind::Notifications {
            return Err(GatewayError::InvalidPayload(
                "notification channels do not carry room updates".to_string(),
            ));
        }

        let data = serde_json::to_value(RoomUpdatePayload {
            room_id: room,
            update_type: update_type.into(),
            payload,
        })
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

        let event = PubSubEvent::new(room, format!("{}_update", room.kind().as_str()), data);
        self.bus
            .publish(event)
            .await
            .map_err(|e| GatewayError::TransientStore(e.to_string()))
    }

    async fn emit_inner(&self, room: RoomId, event: ServerEvent, exclude: Option<IdentityId>) {
        let name = event.name();
        let frame = match event.into_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(room = %room, event = name, error = %e, "Failed to encode event");
                return;
            }
        };

        let mut pubsub = PubSubEvent::new(room, frame.event, frame.data);
        if let Some(identity) = exclude {
            pubsub = pubsub.excluding(identity);
        }

        if let Err(e) = self.bus.publish(pubsub).await {
            tracing::warn!(room = %room, event = name, error = %e, "Broadcast dropped");
        }
    }

    /// Start the delivery loop
    ///
    /// The bus receiver is taken before this returns, so events emitted
    /// afterwards are never missed.
    pub fn start(self: &Arc<Self>) {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Broadcast dispatcher is already running");
            return;
        }

        let receiver = self.bus.subscribe();
        let dispatcher = Arc::clone(self);
        let handle = tokio::spawn(async move {
            dispatcher.run(receiver).await;
        });
        *self.task.lock() = Some(handle);

        tracing::info!("Broadcast dispatcher started");
    }

    /// Stop the delivery loop
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        tracing::info!("Broadcast dispatcher stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }

    async fn run(&self, mut receiver: broadcast::Receiver<ReceivedMessage>) {
        while self.running.load(Ordering::SeqCst) {
            match receiver.recv().await {
                Ok(msg) => {
                    self.deliver(&msg);
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "Broadcast dispatcher lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Event bus closed");
                    break;
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Broadcast dispatcher loop ended");
    }

    /// Deliver one bus event to local subscribers, returning how many got it
    fn deliver(&self, msg: &ReceivedMessage) -> usize {
        let room = msg.channel.room();
        let event = &msg.event;

        let sessions = self.registry.room_sessions(&room);
        if sessions.is_empty() {
            return 0;
        }

        let text = match Frame::new(event.event_type.clone(), event.data.clone()).to_json() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(room = %room, error = %e, "Failed to encode frame");
                return 0;
            }
        };

        let mut sent = 0;
        for session in sessions {
            if event.exclude_identity == Some(session.identity()) {
                continue;
            }
            if session.send_text(text.clone()) {
                sent += 1;
            } else {
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
        self.delivered.fetch_add(sent as u64, Ordering::Relaxed);

        tracing::trace!(
            room = %room,
            event_type = %event.event_type,
            sent = sent,
            "Event dispatched to room"
        );

        sent
    }
}

impl std::fmt::Debug for BroadcastDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastDispatcher")
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
