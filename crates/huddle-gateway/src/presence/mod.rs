//! Room presence

mod tracker;

pub use tracker::PresenceTracker;
