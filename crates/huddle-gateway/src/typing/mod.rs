//! Typing indicators

mod coordinator;

pub use coordinator::TypingCoordinator;
