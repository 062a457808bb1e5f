//! Collaborator traits (ports) - the persistent services the gateway consults

mod collaborators;

pub use collaborators::{
    IdentityDirectory, MembershipChecker, MessageWriter, NotificationWriter, RepoResult,
};
