//! Domain models for FairShare.

pub mod group;
pub mod invite;

pub use group::GroupSummary;
pub use invite::GroupInvite;
