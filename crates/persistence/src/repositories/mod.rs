//! Repository implementations for database operations.

pub mod group;
pub mod invite;
pub mod user;

pub use group::GroupRepository;
pub use invite::{InviteRepository, RedeemOutcome, TokenIssueError};
pub use user::UserRepository;
