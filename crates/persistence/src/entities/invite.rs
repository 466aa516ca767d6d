//! Invite entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::invite::GroupInvite;
use domain::services::invite_policy::InviteSnapshot;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the group_invites table.
#[derive(Debug, Clone, FromRow)]
pub struct GroupInviteEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<GroupInviteEntity> for GroupInvite {
    fn from(row: GroupInviteEntity) -> Self {
        GroupInvite {
            id: row.id,
            group_id: row.group_id,
            token: row.token,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

impl From<&GroupInviteEntity> for InviteSnapshot {
    fn from(row: &GroupInviteEntity) -> Self {
        InviteSnapshot {
            is_active: row.is_active,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
        }
    }
}

/// Invite row joined with creator info, for listing.
#[derive(Debug, Clone, FromRow)]
pub struct InviteWithCreatorEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub creator_name: String,
}

/// Invite row joined with group info, for the public preview.
#[derive(Debug, Clone, FromRow)]
pub struct InviteWithGroupEntity {
    pub id: Uuid,
    pub group_id: Uuid,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub is_active: bool,
    pub group_name: String,
}

impl From<&InviteWithGroupEntity> for InviteSnapshot {
    fn from(row: &InviteWithGroupEntity) -> Self {
        InviteSnapshot {
            is_active: row.is_active,
            expires_at: row.expires_at,
            max_uses: row.max_uses,
            current_uses: row.current_uses,
        }
    }
}
