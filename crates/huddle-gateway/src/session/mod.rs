//! Session management
//!
//! One [`Session`] per authenticated connection, tracked by the [`SessionRegistry`].

mod registry;
mod session;

pub use registry::{RegistryStats, SessionRegistry, SubscribeOutcome};
pub use session::{Session, SessionState};
