//! Room membership

mod membership;

pub use membership::{JoinOutcome, MembershipAuthority};
