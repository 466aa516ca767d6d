//! Group and membership domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to create a new group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGroupRequest {
    #[validate(length(min = 1, max = 100, message = "Group name is required"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    /// Optional initial members, added alongside the creator.
    pub members: Option<Vec<Uuid>>,
}

/// Summary of a group for listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Full group detail with members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct GroupDetail {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub members: Vec<MemberResponse>,
}

/// A group member with display info.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MemberResponse {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    /// True iff this member created the group (single-admin model).
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}

/// Request to add a member directly (admin action, bypasses invites).
///
/// Exactly one of `user_id` or `email` must be present; the handler enforces
/// the one-of rule since `validator` cannot express it.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct AddMemberRequest {
    pub user_id: Option<Uuid>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_group_request_validation() {
        let valid = CreateGroupRequest {
            name: "Trip to Lisbon".to_string(),
            description: Some("Shared costs for the June trip".to_string()),
            members: None,
        };
        assert!(valid.validate().is_ok());

        let empty_name = CreateGroupRequest {
            name: String::new(),
            description: None,
            members: None,
        };
        assert!(empty_name.validate().is_err());

        let long_description = CreateGroupRequest {
            name: "ok".to_string(),
            description: Some("x".repeat(501)),
            members: None,
        };
        assert!(long_description.validate().is_err());
    }

    #[test]
    fn test_add_member_request_validation() {
        let by_email = AddMemberRequest {
            user_id: None,
            email: Some("friend@example.com".to_string()),
        };
        assert!(by_email.validate().is_ok());

        let bad_email = AddMemberRequest {
            user_id: None,
            email: Some("not-an-email".to_string()),
        };
        assert!(bad_email.validate().is_err());
    }
}
