//! Integration test utilities for the realtime gateway
//!
//! Gateways run in-process over the in-memory store and bus, with every
//! relational collaborator played by a [`World`].

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
