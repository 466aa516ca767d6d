//! Invite domain models for group invite links.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::invite_policy::InviteSnapshot;

/// Represents a group invite link.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupInvite {
    pub id: Uuid,
    pub group_id: Uuid,
    pub token: String,
    /// `None` means the invite never expires.
    pub expires_at: Option<DateTime<Utc>>,
    /// `None` means unlimited uses.
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl From<&GroupInvite> for InviteSnapshot {
    fn from(invite: &GroupInvite) -> Self {
        InviteSnapshot {
            is_active: invite.is_active,
            expires_at: invite.expires_at,
            max_uses: invite.max_uses,
            current_uses: invite.current_uses,
        }
    }
}

/// Request to create a new invite link.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteRequest {
    /// Optional expiry; omitted means the invite never expires.
    #[validate(custom(function = "shared::validation::validate_future_timestamp"))]
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional use cap; omitted means unlimited uses.
    #[validate(range(min = 1, max = 10000, message = "max_uses must be between 1 and 10000"))]
    pub max_uses: Option<i32>,
}

/// Response after creating an invite link.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteResponse {
    pub id: Uuid,
    pub group_id: Uuid,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub invite_url: String,
}

/// Summary of an invite for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteSummary {
    pub id: Uuid,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_uses: Option<i32>,
    pub current_uses: i32,
    pub is_active: bool,
    pub created_by: CreatorInfo,
    pub created_at: DateTime<Utc>,
}

/// Creator info for invite listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreatorInfo {
    pub id: Uuid,
    pub name: String,
}

/// Public invite preview (for GET /invites/:token without auth).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitePreview {
    pub valid: bool,
    pub group: PreviewGroupInfo,
}

/// Minimal group info exposed to holders of an invite token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PreviewGroupInfo {
    pub id: Uuid,
    pub name: String,
}

/// Group info returned after a successful join.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinedGroupInfo {
    pub id: Uuid,
    pub name: String,
    pub member_count: i64,
}

/// Membership info returned after a successful join.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinedMembershipInfo {
    pub id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// Response after joining a group via an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct JoinGroupResponse {
    pub group: JoinedGroupInfo,
    pub membership: JoinedMembershipInfo,
}

lazy_static::lazy_static! {
    static ref INVITE_TOKEN_REGEX: regex::Regex =
        regex::Regex::new(r"^[0-9a-f]{64}$").unwrap();
}

/// Returns true if `token` has the shape of an invite token.
///
/// Used to reject malformed path parameters before touching the store; a
/// failed match is indistinguishable from an unknown token to the caller.
pub fn is_token_format(token: &str) -> bool {
    INVITE_TOKEN_REGEX.is_match(token)
}
