//! Invite routes: issuing invite links, previewing them, and joining.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::invite::{
    is_token_format, CreateInviteRequest, CreateInviteResponse, CreatorInfo, InvitePreview,
    InviteSummary, JoinGroupResponse, JoinedGroupInfo, JoinedMembershipInfo, PreviewGroupInfo,
};
use domain::services::invite_policy::{self, InviteRejection};
use persistence::repositories::{GroupRepository, InviteRepository, RedeemOutcome};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::record_redemption;
use crate::response::Envelope;

/// Create a new invite link for a group.
///
/// POST /api/v1/groups/:group_id/invites
///
/// Any member of the group can create invites. Omitted `expires_at` and
/// `max_uses` mean the invite never expires and has no use cap.
pub async fn create_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<(StatusCode, Json<Envelope<CreateInviteResponse>>), ApiError> {
    request.validate()?;

    let group_repo = GroupRepository::new(state.pool.clone());
    let invite_repo = InviteRepository::new(state.pool.clone());

    group_repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !group_repo.is_member(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "You must be a member of this group to create invites".to_string(),
        ));
    }

    let token = invite_repo
        .generate_unique_token(shared::token::generate_invite_token)
        .await?;

    let invite = invite_repo
        .create_invite(
            group_id,
            &token,
            request.expires_at,
            request.max_uses,
            user_auth.user_id,
        )
        .await?;

    info!(
        group_id = %group_id,
        invite_id = %invite.id,
        user_id = %user_auth.user_id,
        "Invite created"
    );

    let invite_url = format!(
        "{}/join/{}",
        state.config.server.app_base_url.trim_end_matches('/'),
        invite.token
    );

    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(
            CreateInviteResponse {
                id: invite.id,
                group_id: invite.group_id,
                token: invite.token,
                expires_at: invite.expires_at,
                max_uses: invite.max_uses,
                current_uses: invite.current_uses,
                created_by: invite.created_by,
                created_at: invite.created_at,
                invite_url,
            },
            "Invite created successfully",
        )),
    ))
}

/// List a group's invites that have not been deactivated, newest first.
///
/// GET /api/v1/groups/:group_id/invites
///
/// Requires membership. Expired and fully used invites still appear.
pub async fn list_invites(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(group_id): Path<Uuid>,
) -> Result<Json<Envelope<Vec<InviteSummary>>>, ApiError> {
    let group_repo = GroupRepository::new(state.pool.clone());
    let invite_repo = InviteRepository::new(state.pool.clone());

    group_repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !group_repo.is_member(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "You are not a member of this group".to_string(),
        ));
    }

    let invites = invite_repo
        .list_active_by_group(group_id)
        .await?
        .into_iter()
        .map(|i| InviteSummary {
            id: i.id,
            token: i.token,
            expires_at: i.expires_at,
            max_uses: i.max_uses,
            current_uses: i.current_uses,
            is_active: i.is_active,
            created_by: CreatorInfo {
                id: i.created_by,
                name: i.creator_name,
            },
            created_at: i.created_at,
        })
        .collect();

    Ok(Json(Envelope::data(invites)))
}

/// Deactivate an invite link. Terminal; a disabled invite never comes back.
///
/// DELETE /api/v1/groups/:group_id/invites/:invite_id
///
/// Admin only.
pub async fn deactivate_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((group_id, invite_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Envelope<()>>, ApiError> {
    let group_repo = GroupRepository::new(state.pool.clone());
    let invite_repo = InviteRepository::new(state.pool.clone());

    group_repo
        .find_by_id(group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    if !group_repo.is_admin(group_id, user_auth.user_id).await? {
        return Err(ApiError::Forbidden(
            "Only the group admin can deactivate invites".to_string(),
        ));
    }

    let invite = invite_repo
        .find_by_id(invite_id)
        .await?
        .filter(|i| i.group_id == group_id)
        .ok_or_else(|| ApiError::NotFound("Invite not found".to_string()))?;

    invite_repo.deactivate(invite.id).await?;

    info!(
        group_id = %group_id,
        invite_id = %invite_id,
        user_id = %user_auth.user_id,
        "Invite deactivated"
    );

    Ok(Json(Envelope::message("Invite link has been disabled")))
}

/// Preview an invite without joining.
///
/// GET /api/v1/invites/:token
///
/// Public: no authentication required, the token itself is the capability.
/// Returns minimal group info for a usable invite; a malformed or unknown
/// token is indistinguishable from an invalid one.
pub async fn preview_invite(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<Envelope<InvitePreview>>, ApiError> {
    if !is_token_format(&token) {
        return Err(ApiError::InviteState(InviteRejection::InvalidToken));
    }

    let invite_repo = InviteRepository::new(state.pool.clone());

    let invite = invite_repo
        .find_by_token_with_group(&token)
        .await?
        .ok_or(ApiError::InviteState(InviteRejection::InvalidToken))?;

    invite_policy::evaluate(&(&invite).into(), chrono::Utc::now())
        .map_err(ApiError::InviteState)?;

    Ok(Json(Envelope::data(InvitePreview {
        valid: true,
        group: PreviewGroupInfo {
            id: invite.group_id,
            name: invite.group_name,
        },
    })))
}

/// Join a group by redeeming an invite token.
///
/// POST /api/v1/invites/:token/join
///
/// Requires JWT authentication. Redemption is atomic: under concurrent joins
/// a bounded invite never admits more members than `max_uses`. Joining a
/// group the caller already belongs to is a conflict and consumes no use.
pub async fn join_via_invite(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(token): Path<String>,
) -> Result<Json<Envelope<JoinGroupResponse>>, ApiError> {
    if !is_token_format(&token) {
        return Err(ApiError::InviteState(InviteRejection::InvalidToken));
    }

    let group_repo = GroupRepository::new(state.pool.clone());
    let invite_repo = InviteRepository::new(state.pool.clone());

    let outcome = invite_repo
        .redeem(&token, user_auth.user_id, state.config.invites.lock_timeout_ms)
        .await?;

    let (invite, membership) = match outcome {
        RedeemOutcome::Joined { invite, membership } => {
            record_redemption("joined");
            (invite, membership)
        }
        RedeemOutcome::AlreadyMember => {
            record_redemption("already_member");
            return Err(ApiError::Conflict(
                "You are already a member of this group".to_string(),
            ));
        }
        RedeemOutcome::Rejected(reason) => {
            record_redemption(reason.reason());
            return Err(ApiError::InviteState(reason));
        }
        RedeemOutcome::Busy => {
            record_redemption("busy");
            return Err(ApiError::Busy);
        }
    };

    let group = group_repo
        .find_with_member_count(invite.group_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Group not found".to_string()))?;

    info!(
        group_id = %group.id,
        invite_id = %invite.id,
        user_id = %user_auth.user_id,
        "User joined group via invite"
    );

    Ok(Json(Envelope::with_message(
        JoinGroupResponse {
            group: JoinedGroupInfo {
                id: group.id,
                name: group.name,
                member_count: group.member_count,
            },
            membership: JoinedMembershipInfo {
                id: membership.id,
                joined_at: membership.joined_at,
            },
        },
        "Successfully joined the group",
    )))
}
