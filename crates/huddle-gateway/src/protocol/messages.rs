//! Gateway message format
//!
//! Every WebSocket text frame is a JSON object `{"event": <name>, "data": <payload>}`.

use huddle_core::RoomId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    ErrorPayload, IdentityInRoomPayload, IdentityListPayload, IdentityRefPayload,
    JoinedRoomPayload, NewMessagePayload, NewNotificationPayload, ReadyPayload, RoomPayload,
    SendMessagePayload, StatusUpdatePayload, UpdateStatusPayload,
};

/// Wire envelope shared by both directions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Frame {
    #[must_use]
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Parse a frame from JSON text
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }

    /// Serialize to JSON text
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Failure to turn inbound text into a [`ClientEvent`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    #[error("Invalid data for {event}: {reason}")]
    InvalidData { event: String, reason: String },
}

impl ProtocolError {
    /// Inbound event name, when the frame got far enough to have one
    #[must_use]
    pub fn event(&self) -> Option<&str> {
        match self {
            Self::Malformed(_) => None,
            Self::UnknownEvent(event) | Self::InvalidData { event, .. } => Some(event),
        }
    }
}

/// Events a client may send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    JoinRoom(RoomPayload),
    LeaveRoom(RoomPayload),
    SendMessage(SendMessagePayload),
    TypingStart(RoomPayload),
    TypingStop(RoomPayload),
    GetOnlineUsers(RoomPayload),
    SubscribeNotifications,
    UnsubscribeNotifications,
    UpdateStatus(UpdateStatusPayload),
    Logout,
}

impl ClientEvent {
    pub const JOIN_ROOM: &'static str = "join_room";
    pub const LEAVE_ROOM: &'static str = "leave_room";
    pub const SEND_MESSAGE: &'static str = "send_message";
    pub const TYPING_START: &'static str = "typing_start";
    pub const TYPING_STOP: &'static str = "typing_stop";
    pub const GET_ONLINE_USERS: &'static str = "get_online_users";
    pub const SUBSCRIBE_NOTIFICATIONS: &'static str = "subscribe_notifications";
    pub const UNSUBSCRIBE_NOTIFICATIONS: &'static str = "unsubscribe_notifications";
    pub const UPDATE_STATUS: &'static str = "update_status";
    pub const LOGOUT: &'static str = "logout";

    /// Parse a decoded frame
    ///
    /// This is the complete table of inbound events; anything else is rejected.
    pub fn from_frame(frame: Frame) -> Result<Self, ProtocolError> {
        let Frame { event, data } = frame;

        match event.as_str() {
            Self::JOIN_ROOM => payload(&event, data).map(Self::JoinRoom),
            Self::LEAVE_ROOM => payload(&event, data).map(Self::LeaveRoom),
            Self::SEND_MESSAGE => payload(&event, data).map(Self::SendMessage),
            Self::TYPING_START => payload(&event, data).map(Self::TypingStart),
            Self::TYPING_STOP => payload(&event, data).map(Self::TypingStop),
            Self::GET_ONLINE_USERS => payload(&event, data).map(Self::GetOnlineUsers),
            Self::UPDATE_STATUS => payload(&event, data).map(Self::UpdateStatus),
            Self::SUBSCRIBE_NOTIFICATIONS => Ok(Self::SubscribeNotifications),
            Self::UNSUBSCRIBE_NOTIFICATIONS => Ok(Self::UnsubscribeNotifications),
            Self::LOGOUT => Ok(Self::Logout),
            _ => Err(ProtocolError::UnknownEvent(event)),
        }
    }

    /// Parse JSON text straight into an event
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Self::from_frame(Frame::from_json(text)?)
    }

    /// Wire name of this event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => Self::JOIN_ROOM,
            Self::LeaveRoom(_) => Self::LEAVE_ROOM,
            Self::SendMessage(_) => Self::SEND_MESSAGE,
            Self::TypingStart(_) => Self::TYPING_START,
            Self::TypingStop(_) => Self::TYPING_STOP,
            Self::GetOnlineUsers(_) => Self::GET_ONLINE_USERS,
            Self::SubscribeNotifications => Self::SUBSCRIBE_NOTIFICATIONS,
            Self::UnsubscribeNotifications => Self::UNSUBSCRIBE_NOTIFICATIONS,
            Self::UpdateStatus(_) => Self::UPDATE_STATUS,
            Self::Logout => Self::LOGOUT,
        }
    }

    /// Room the event targets, if it names one
    #[must_use]
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Self::JoinRoom(p)
            | Self::LeaveRoom(p)
            | Self::TypingStart(p)
            | Self::TypingStop(p)
            | Self::GetOnlineUsers(p) => Some(p.room_id),
            Self::SendMessage(p) => Some(p.room_id),
            Self::SubscribeNotifications
            | Self::UnsubscribeNotifications
            | Self::UpdateStatus(_)
            | Self::Logout => None,
        }
    }
}

fn payload<T: serde::de::DeserializeOwned>(event: &str, data: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(data).map_err(|e| ProtocolError::InvalidData {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

/// Events the gateway sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    Ready(ReadyPayload),
    JoinedRoom(JoinedRoomPayload),
    LeftRoom(RoomPayload),
    UserOnline(IdentityInRoomPayload),
    UserOffline(IdentityRefPayload),
    OnlineUsers(IdentityListPayload),
    NewMessage(NewMessagePayload),
    UserTyping(IdentityInRoomPayload),
    UserStoppedTyping(IdentityRefPayload),
    CurrentTypingUsers(IdentityListPayload),
    StatusUpdate(StatusUpdatePayload),
    NewNotification(NewNotificationPayload),
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Wire name of this event
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::JoinedRoom(_) => "joined_room",
            Self::LeftRoom(_) => "left_room",
            Self::UserOnline(_) => "user_online",
            Self::UserOffline(_) => "user_offline",
            Self::OnlineUsers(_) => "online_users",
            Self::NewMessage(_) => "new_message",
            Self::UserTyping(_) => "user_typing",
            Self::UserStoppedTyping(_) => "user_stopped_typing",
            Self::CurrentTypingUsers(_) => "current_typing_users",
            Self::StatusUpdate(_) => "status_update",
            Self::NewNotification(_) => "new_notification",
            Self::Error(_) => "error",
        }
    }

    /// Serialize to the JSON text sent on the socket
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Split into the event name and payload, as carried on the bus
    pub fn into_frame(self) -> Result<Frame, serde_json::Error> {
        serde_json::from_value(serde_json::to_value(self)?)
    }
}
