//! Group management routes for creating and managing expense groups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::group::{
    AddMemberRequest, CreateGroupRequest, GroupDetail, GroupSummary, MemberResponse,
};
use persistence::repositories::{GroupRepository, UserRepository};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::response::Envelope;

/// Create a new group.
///
/// POST /api/v1/groups
///
/// Requires JWT authentication. The creator becomes the group admin and its
/// first member; any `members` listed in the request are added alongside.
pub async fn create_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<Envelope<GroupSummary>>), ApiError> {
    request.validate()?;

    let repo = GroupRepository::new(state.pool.clone());

    let initial_members = request.members.unwrap_or_default();
    let group = repo
        .create_group(
            &request.name,
            request.description.as_deref(),
            user_auth.user_id,
            &initial_members,
        )
        .await?;

    let member_count = repo.count_members(group.id).await?;

    info!(
        group_id = %group.id,
        group_name = %group.name,
        user_id = %user_auth.user_id,
        "Group created"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            GroupSummary {
                id: group.id,
                name: group.name,
                description: group.description,
                created_by: group.created_by,
                member_count,
                created_at: group.created_at,
            },
            "Group created successfully",
        )),
    ))
}

/// List the caller's groups, most recently joined first.
///
/// GET /api/v1/groups
pub async fn list_groups(
    State(state): State<AppState>,
    user_auth: UserAuth,
) -> Result<Json<Envelope<Vec<GroupSummary>>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());

    let groups = repo
        .find_user_groups(user_auth.user_id)
        .await?
        .into_iter()
        .map(|g| GroupSummary {
            id: g.id,
            name: g.name,
            description: g.description,
            created_by: g.created_by,
            member_count: g.member_count,
            created_at: g.created_at,
        })
        .collect();

    Ok(Json(Envelope::data(groups)))
}

/// Get a group with its member list.
///
/// GET /api/v1/groups/:group_id
///
/// Requires membership in the group.
pub async fn get_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Envelope<GroupDetail>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());

    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !repo.is_member(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        ));
    }

    let members = repo
        .list_members(group_id)
        .await?
        .into_iter()
        .map(|m| MemberResponse {
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            is_admin: m.user_id == group.created_by,
            joined_at: m.joined_at,
        })
        .collect();

    Ok(Json(Envelope::data(GroupDetail {
        id: group.id,
        name: group.name,
        description: group.description,
        created_by: group.created_by,
        created_at: group.created_at,
        members,
    })))
}

/// Soft delete a group.
///
/// DELETE /api/v1/groups/:group_id
///
/// Admin only. Invites of a deleted group stop resolving.
pub async fn delete_group(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());

    repo.find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !repo.is_admin(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "Only the group admin can delete the group".to_string(),
        ));
    }

    repo.delete_group(group_id).await?;

    info!(
        group_id = %group_id,
        user_id = %user_auth.user_id,
        "Group deleted"
    );

    Ok(Json(Envelope::message("Group deleted successfully")))
}

/// List members of a group.
///
/// GET /api/v1/groups/:group_id/members
///
/// Requires membership in the group.
pub async fn list_members(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<MemberResponse>>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());

    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !repo.is_member(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        ));
    }

    let members = repo
        .list_members(group_id)
        .await?
        .into_iter()
        .map(|m| MemberResponse {
            user_id: m.user_id,
            name: m.name,
            email: m.email,
            is_admin: m.user_id == group.created_by,
            joined_at: m.joined_at,
        })
        .collect();

    Ok(Json(Envelope::data(members)))
}

/// Add a member directly, by user id or email.
///
/// POST /api/v1/groups/:group_id/members
///
/// Admin only; exactly one of `user_id` or `email` must be given.
pub async fn add_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<AddMemberRequest>,
) -> Result<(StatusCode, Json<Envelope<MemberResponse>>), ApiError> {
    request.validate()?;

    if request.user_id.is_some() == request.email.is_some() {
        return Err(ApiError::Validation(
            "Provide exactly one of user_id or email".to_string(),
        ));
    }

    let group_repo = GroupRepository::new(state.pool.clone());
    let user_repo = UserRepository::new(state.pool.clone());

    let group = group_repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !group_repo.is_admin(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "Only the group admin can add members".to_string(),
        ));
    }

    let user = match (request.user_id, request.email.as_deref()) {
        (Some(id), None) => user_repo.find_by_id(id).await?,
        (None, Some(email)) => user_repo.find_by_email(email).await?,
        _ => unreachable!("one-of rule checked above"),
    }
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let membership = match group_repo.add_member(group_id, user.id).await {
        Ok(membership) => membership,
        Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23505") => {
            return Err(ApiError::Conflict(
                "User is already a member of this group".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        group_id = %group_id,
        member_id = %user.id,
        user_id = %user_auth.user_id,
        "Member added"
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            MemberResponse {
                user_id: user.id,
                name: user.name,
                email: user.email,
                is_admin: user.id == group.created_by,
                joined_at: membership.joined_at,
            },
            "Member added successfully",
        )),
    ))
}

/// Remove a member from a group.
///
/// DELETE /api/v1/groups/:group_id/members/:user_id
///
/// The admin may remove anyone; a member may remove themselves (leave).
/// The group creator can never be removed.
pub async fn remove_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((group_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let repo = GroupRepository::new(state.pool.clone());

    let group = repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if user_id == group.created_by {
        return Err(ApiError::Forbidden(
            "Cannot remove the group creator".to_string(),
        ));
    }

    let is_self = user_id == user_auth.user_id;
    if !is_self && !repo.is_admin(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "Only the group admin can remove other members".to_string(),
        ));
    }

    let removed = repo.remove_member(group_id, user_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(
            "User is not a member of this group".to_string(),
        ));
    }

    info!(
        group_id = %group_id,
        member_id = %user_id,
        user_id = %user_auth.user_id,
        "Member removed"
    );

    Ok(Json(Envelope::message("Member removed successfully")))
}
