//! Typing handlers (`typing_start`, `typing_stop`)

use super::HandlerResult;
use crate::protocol::RoomPayload;
use crate::server::GatewayState;
use crate::session::Session;
use std::sync::Arc;

/// Typing is best-effort: events for rooms the session has not joined, or
/// that carry no presence, are ignored without an error.
pub struct TypingHandler;

impl TypingHandler {
    pub async fn start(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let room = payload.room_id;
        if !Self::accepts(session, &payload) {
            tracing::trace!(session_id = %session.id(), room = %room, "Typing start ignored");
            return Ok(());
        }
        state.typing().start(room, session.profile()).await;
        Ok(())
    }

    pub async fn stop(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: RoomPayload,
    ) -> HandlerResult<()> {
        let room = payload.room_id;
        if !Self::accepts(session, &payload) {
            tracing::trace!(session_id = %session.id(), room = %room, "Typing stop ignored");
            return Ok(());
        }
        state.typing().stop(room, session.identity()).await;
        Ok(())
    }

    fn accepts(session: &Session, payload: &RoomPayload) -> bool {
        payload.room_id.kind().tracks_presence() && session.has_joined(&payload.room_id)
    }
}
