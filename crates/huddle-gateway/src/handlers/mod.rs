//! Inbound event handlers
//!
//! Every client event goes through [`EventRouter`], which maps the event to its
//! handler and turns failures into an `error` event for the requesting session.

mod error;
mod messages;
mod notifications;
mod rooms;
mod status;
mod typing;

pub use error::{GatewayError, HandlerResult};
pub use messages::MessageHandler;
pub use notifications::NotificationHandler;
pub use rooms::RoomHandler;
pub use status::StatusHandler;
pub use typing::TypingHandler;

use crate::protocol::{ClientEvent, CloseCode};
use crate::server::GatewayState;
use crate::session::Session;
use std::sync::Arc;

/// Dispatch table for inbound events
pub struct EventRouter;

impl EventRouter {
    /// Handle one inbound text frame
    ///
    /// Errors never escape: they are reported to this session only. Returns a
    /// close code when the connection should end.
    pub async fn handle_text(
        state: &GatewayState,
        session: &Arc<Session>,
        text: &str,
    ) -> Option<CloseCode> {
        let event = match ClientEvent::from_json(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(session_id = %session.id(), error = %e, "Rejected frame");
                let event_name = e.event().map(str::to_string);
                session.send(&GatewayError::from(e).to_event(event_name.as_deref(), None));
                return None;
            }
        };

        let name = event.name();
        let room = event.room_id();

        match Self::dispatch(state, session, event).await {
            Ok(close) => close,
            Err(e) => {
                tracing::debug!(
                    session_id = %session.id(),
                    event = name,
                    error = %e,
                    "Event failed"
                );
                session.send(&e.to_event(Some(name), room));
                None
            }
        }
    }

    /// Route a parsed event to its handler
    pub async fn dispatch(
        state: &GatewayState,
        session: &Arc<Session>,
        event: ClientEvent,
    ) -> HandlerResult<Option<CloseCode>> {
        tracing::trace!(session_id = %session.id(), event = event.name(), "Dispatching event");

        match event {
            ClientEvent::JoinRoom(payload) => RoomHandler::join(state, session, payload).await?,
            ClientEvent::LeaveRoom(payload) => RoomHandler::leave(state, session, payload).await?,
            ClientEvent::GetOnlineUsers(payload) => {
                RoomHandler::online_users(state, session, payload).await?;
            }
            ClientEvent::SendMessage(payload) => {
                MessageHandler::send(state, session, payload).await?;
            }
            ClientEvent::TypingStart(payload) => {
                TypingHandler::start(state, session, payload).await?;
            }
            ClientEvent::TypingStop(payload) => TypingHandler::stop(state, session, payload).await?,
            ClientEvent::SubscribeNotifications => {
                NotificationHandler::subscribe(state, session).await?;
            }
            ClientEvent::UnsubscribeNotifications => {
                NotificationHandler::unsubscribe(state, session).await?;
            }
            ClientEvent::UpdateStatus(payload) => {
                StatusHandler::handle(state, session, payload).await?;
            }
            ClientEvent::Logout => {
                tracing::info!(session_id = %session.id(), "Logout requested");
                return Ok(Some(CloseCode::LoggedOut));
            }
        }

        Ok(None)
    }
}
