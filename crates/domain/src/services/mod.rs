//! Domain services containing business logic.

pub mod invite_policy;
