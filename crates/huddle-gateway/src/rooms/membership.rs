//! Room membership authority
//!
//! Authorizes joins against the membership collaborator, then keeps the
//! session's subscriptions, presence and typing state in step.

use std::sync::Arc;

use huddle_core::{DomainError, IdentityId, MembershipChecker, RoomId};

use crate::broadcast::BroadcastDispatcher;
use crate::handlers::{GatewayError, HandlerResult};
use crate::presence::PresenceTracker;
use crate::protocol::{
    IdentityInRoomPayload, IdentityListPayload, IdentityRefPayload, JoinedRoomPayload,
    RoomPayload, ServerEvent,
};
use crate::session::{Session, SessionRegistry, SubscribeOutcome};
use crate::typing::TypingCoordinator;

/// What a join request ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Subscribed (or re-joined) and answered with `joined_room`
    Joined,
    /// The session was no longer active; nothing changed
    Ignored,
}

pub struct MembershipAuthority {
    checker: Arc<dyn MembershipChecker>,
    registry: Arc<SessionRegistry>,
    presence: Arc<PresenceTracker>,
    typing: Arc<TypingCoordinator>,
    dispatcher: Arc<BroadcastDispatcher>,
}

impl MembershipAuthority {
    pub fn new(
        checker: Arc<dyn MembershipChecker>,
        registry: Arc<SessionRegistry>,
        presence: Arc<PresenceTracker>,
        typing: Arc<TypingCoordinator>,
        dispatcher: Arc<BroadcastDispatcher>,
    ) -> Self {
        Self {
            checker,
            registry,
            presence,
            typing,
            dispatcher,
        }
    }

    /// Check that `identity` may join `room`
    ///
    /// Notification channels belong to their owner alone and never reach the
    /// collaborator.
    pub async fn authorize(&self, identity: IdentityId, room: &RoomId) -> HandlerResult<()> {
        let allowed = match room.notification_owner() {
            Some(owner) => owner == identity,
            None => self.checker.is_member(identity, room).await?,
        };

        if allowed {
            Ok(())
        } else {
            tracing::warn!(identity_id = %identity, room = %room, "Join denied");
            Err(GatewayError::from(DomainError::NotMember(*room)))
        }
    }

    /// Join `room` on behalf of `session`
    ///
    /// A denied join changes nothing. Joining again refreshes presence without
    /// announcing the identity a second time.
    pub async fn join(&self, session: &Arc<Session>, room: RoomId) -> HandlerResult<JoinOutcome> {
        let identity = session.identity();
        self.authorize(identity, &room).await?;

        if self.registry.subscribe(session, room) == SubscribeOutcome::NotActive {
            tracing::debug!(
                session_id = %session.id(),
                room = %room,
                "Join for inactive session ignored"
            );
            return Ok(JoinOutcome::Ignored);
        }

        let tracks_presence = room.kind().tracks_presence();
        let online_count = if tracks_presence {
            let newly_online = self.presence.add(&room, identity, session.id()).await;

            // Torn down or left while the write was in flight.
            if !self.registry.is_subscribed(&room, session.id()) {
                self.presence.remove(&room, identity, session.id()).await;
                tracing::debug!(
                    session_id = %session.id(),
                    room = %room,
                    "Join overtaken by teardown"
                );
                return Ok(JoinOutcome::Ignored);
            }

            if newly_online {
                self.dispatcher
                    .emit(
                        room,
                        ServerEvent::UserOnline(IdentityInRoomPayload {
                            room_id: room,
                            identity: session.profile().clone(),
                        }),
                    )
                    .await;
            }
            self.presence.count(&room).await
        } else {
            None
        };

        session.send(&ServerEvent::JoinedRoom(JoinedRoomPayload {
            room_id: room,
            online_count,
        }));

        if tracks_presence {
            if let Some(identity_ids) = self.typing.query(&room).await {
                session.send(&ServerEvent::CurrentTypingUsers(IdentityListPayload {
                    room_id: room,
                    identity_ids,
                }));
            }
        }

        tracing::debug!(
            session_id = %session.id(),
            room = %room,
            online_count = ?online_count,
            "Joined room"
        );
        Ok(JoinOutcome::Joined)
    }

    /// Leave `room`; always permitted
    pub async fn leave(&self, session: &Arc<Session>, room: RoomId) {
        self.registry.unsubscribe(session, &room);
        self.release(session, room).await;
        session.send(&ServerEvent::LeftRoom(RoomPayload { room_id: room }));

        tracing::debug!(session_id = %session.id(), room = %room, "Left room");
    }

    /// Drop the session's presence in `room`, announcing the identity offline
    /// when this was its last session there
    pub async fn release(&self, session: &Session, room: RoomId) {
        if !room.kind().tracks_presence() {
            return;
        }

        let identity = session.identity();
        if self.presence.remove(&room, identity, session.id()).await {
            self.typing.clear(room, identity).await;
            self.dispatcher
                .emit(
                    room,
                    ServerEvent::UserOffline(IdentityRefPayload {
                        room_id: room,
                        identity_id: identity,
                    }),
                )
                .await;
        }
    }

    /// Release every room of a torn-down session
    pub async fn release_all(&self, session: &Session, rooms: Vec<RoomId>) {
        for room in rooms {
            self.release(session, room).await;
        }
    }
}

impl std::fmt::Debug for MembershipAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MembershipAuthority").finish_non_exhaustive()
    }
}
