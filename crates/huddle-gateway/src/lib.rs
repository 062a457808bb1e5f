//! # huddle-gateway
//!
//! WebSocket gateway that keeps room presence, typing indicators and chat
//! delivery in sync across many long-lived connections.
//!
//! Presence and typing live in a shared TTL store and room events travel over
//! a shared bus, so several gateway processes can serve the same rooms.

pub mod broadcast;
pub mod handlers;
pub mod presence;
pub mod protocol;
pub mod rooms;
pub mod server;
pub mod session;
pub mod typing;

#[cfg(test)]
mod testing;

pub use server::{
    create_app, create_gateway_state, create_router, run, run_server, Collaborators, GatewayState,
};
