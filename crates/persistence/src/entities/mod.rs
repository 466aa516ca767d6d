//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod group;
pub mod invite;
pub mod user;

pub use group::{
    GroupEntity, GroupMembershipEntity, GroupWithCountEntity, MemberWithUserEntity,
};
pub use invite::{GroupInviteEntity, InviteWithCreatorEntity, InviteWithGroupEntity};
pub use user::UserEntity;
