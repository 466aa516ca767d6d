//! Shared utilities and common types for the FairShare backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access token validation and issuance
//! - Cryptographically secure invite token generation
//! - Common validation logic

pub mod jwt;
pub mod token;
pub mod validation;
