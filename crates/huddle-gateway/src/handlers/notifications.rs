//! Notification channel handlers

use super::HandlerResult;
use crate::server::GatewayState;
use crate::session::Session;
use huddle_core::RoomId;
use std::sync::Arc;

/// Subscribes a session to its own identity's notification channel
pub struct NotificationHandler;

impl NotificationHandler {
    pub async fn subscribe(state: &GatewayState, session: &Arc<Session>) -> HandlerResult<()> {
        let room = RoomId::notifications(session.identity());
        state.membership().join(session, room).await?;
        Ok(())
    }

    pub async fn unsubscribe(state: &GatewayState, session: &Arc<Session>) -> HandlerResult<()> {
        let room = RoomId::notifications(session.identity());
        state.membership().leave(session, room).await;
        Ok(())
    }
}
