//! Room handlers (`join_room`, `leave_room`, `get_online_users`)

use super::{GatewayError, HandlerResult};
use crate::protocol::{IdentityListPayload, RoomPayload, ServerEvent};
use crate::server::GatewayState;
use crate::session::Session;
use huddle_core::DomainError;
use std::sync::Arc;

pub struct RoomHandler;

impl RoomHandler {
    pub async fn join(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        state.membership().join(session, payload.room_id).await?;
        Ok(())
    }

    pub async fn leave(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        state.membership().leave(session, payload.room_id).await;
        Ok(())
    }

    /// Answer with the identities online in a joined room
    pub async fn online_users(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let room = payload.room_id;
        if !session.has_joined(&room) {
            return Err(DomainError::NotJoined(room).into());
        }

        let identity_ids = state.presence().query(&room).await.ok_or_else(|| {
            GatewayError::TransientStore(format!("presence for {room} is unknown"))
        })?;

        session.send(&ServerEvent::OnlineUsers(IdentityListPayload {
            room_id: room,
            identity_ids,
        }));
        Ok(())
    }
}
