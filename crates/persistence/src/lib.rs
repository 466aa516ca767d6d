//! Persistence layer for the FairShare backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional invite
//!   redemption that backs the join protocol

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
