//! Event broadcasting
//!
//! Publishes room events on the event bus and delivers them to local sessions.

mod dispatcher;

pub use dispatcher::{BroadcastDispatcher, DispatchStats};
