//! Database models
//!
//! Row types read with SQLx `FromRow`.

mod profile;
mod records;

pub use profile::ProfileModel;
pub use records::{InsertedRow, MembershipRow};
