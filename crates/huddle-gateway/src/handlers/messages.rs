//! `send_message` handler

use super::{GatewayError, HandlerResult};
use crate::protocol::{NewMessagePayload, SendMessagePayload, ServerEvent};
use crate::server::GatewayState;
use crate::session::Session;
use huddle_core::{DomainError, MessageRecord, NewMessage, RoomKind};
use std::sync::Arc;

pub struct MessageHandler;

impl MessageHandler {
    /// Durably write a chat message, then broadcast it to the room
    ///
    /// Nothing is broadcast unless the write succeeded, so every `new_message`
    /// carries its durable id. A failed write is reported to the sender.
    pub async fn send(
        state: &GatewayState,
        session: &Arc<Session>,
        payload: SendMessagePayload,
    ) -> HandlerResult<MessageRecord> {
        let room = payload.room_id;
        if room.kind() == RoomKind::Notifications {
            return Err(GatewayError::InvalidPayload(
                "notification channels do not accept messages".to_string(),
            ));
        }
        if !session.has_joined(&room) {
            return Err(DomainError::NotJoined(room).into());
        }

        let message = NewMessage::new(
            &payload.body,
            payload.kind,
            payload.attachments,
            state.config().max_message_length,
        )?;

        let stored = state
            .messages()
            .write_message(&room, session.identity(), &message)
            .await
            .map_err(|e| {
                tracing::warn!(
                    session_id = %session.id(),
                    room = %room,
                    error = %e,
                    "Message write failed"
                );
                GatewayError::from(e)
            })?;

        let record = MessageRecord::from_stored(stored, room, session.profile().clone(), message);

        tracing::debug!(
            session_id = %session.id(),
            room = %room,
            message_id = record.id,
            "Message stored"
        );

        state
            .dispatcher()
            .emit(
                room,
                ServerEvent::NewMessage(NewMessagePayload {
                    message: record.clone(),
                }),
            )
            .await;

        Ok(record)
    }
}
