//! `update_status` handler

use super::HandlerResult;
use crate::protocol::{ServerEvent, StatusUpdatePayload, UpdateStatusPayload};
use crate::server::GatewayState;
use crate::session::Session;
use std::sync::Arc;

pub struct StatusHandler;

impl StatusHandler {
    /// Store the status on the session and announce it in every joined room
    /// that carries presence
    pub async fn handle(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: UpdateStatusPayload,
    ) -> HandlerResult<()> {
        session.set_status(payload.status);

        let rooms: Vec<_> = session
            .rooms()
            .into_iter()
            .filter(|room| room.kind().tracks_presence())
            .collect();

        for room in &rooms {
            state
                .dispatcher()
                .emit(
                    *room,
                    ServerEvent::StatusUpdate(StatusUpdatePayload {
                        room_id: *room,
                        identity_id: session.identity(),
                        status: payload.status,
                    }),
                )
                .await;
        }

        tracing::debug!(
            session_id = %session.id(),
            status = ?payload.status,
            rooms = rooms.len(),
            "Status updated"
        );
        Ok(())
    }
}
