//! Domain layer for the FairShare backend.
//!
//! This crate contains:
//! - Domain models (groups, memberships, invites)
//! - Pure business rules (invite usability policy)

pub mod models;
pub mod services;
