//! Value objects - immutable types that represent domain concepts

mod identity;
mod room;

pub use identity::{IdentityId, IdentityIdParseError};
pub use room::{RoomId, RoomKind};
