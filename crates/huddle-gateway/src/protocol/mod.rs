//! Gateway protocol definitions
//!
//! Defines the JSON frame format, the inbound and outbound event sets, and close codes.

mod close_codes;
mod messages;
mod payloads;

pub use close_codes::CloseCode;
pub use messages::{ClientEvent, Frame, ProtocolError, ServerEvent};
pub use payloads::{
    ErrorPayload, IdentityInRoomPayload, IdentityListPayload, IdentityRefPayload,
    JoinedRoomPayload, NewMessagePayload, NewNotificationPayload, ReadyPayload, RoomPayload,
    RoomUpdatePayload, SendMessagePayload, StatusUpdatePayload, UpdateStatusPayload, UserStatus,
};
