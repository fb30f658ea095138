use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use gymdesk_core::error::GymError;
use gymdesk_core::models::staff::{
    CreateStaffMember, StaffMember, StaffStatus, UpdateStaffMember,
};
use gymdesk_core::repository::{PaginatedResult, StaffRepository};
use gymdesk_core::validation::{MIN_PASSWORD_LEN, is_valid_email};
use gymdesk_services::activity::Activity;
use uuid::Uuid;

use super::PageQuery;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff", get(list).post(create))
        .route("/staff/:id", get(fetch).patch(update).delete(remove))
}

async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<StaffMember>>> {
    ctx.require_owner()?;
    Ok(Json(state.staff().list(ctx.unit_id, page.pagination()).await?))
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateStaffMember>,
) -> ApiResult<(StatusCode, Json<StaffMember>)> {
    ctx.require_owner()?;
    if body.name.trim().is_empty() {
        return Err(GymError::validation("name is required").into());
    }
    if !is_valid_email(&body.email) {
        return Err(GymError::validation("invalid email").into());
    }
    if body.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(GymError::validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        ))
        .into());
    }
    body.unit_id = ctx.unit_id;

    let member = state.staff().create(body).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "staff.created",
            "staff",
            member.id,
            format!("Staff member {} added as {}", member.name, member.role),
        ))
        .await;
    Ok((StatusCode::CREATED, Json(member)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<StaffMember>> {
    if id != ctx.staff_id {
        ctx.require_owner()?;
    }
    Ok(Json(state.staff().get_by_id(ctx.unit_id, id).await?))
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStaffMember>,
) -> ApiResult<Json<StaffMember>> {
    ctx.require_owner()?;
    if let Some(email) = &body.email
        && !is_valid_email(email)
    {
        return Err(GymError::validation("invalid email").into());
    }
    let deactivating = body.status == Some(StaffStatus::Inactive);
    if deactivating && id == ctx.staff_id {
        return Err(cannot_deactivate_self().into());
    }
    let member = state.staff().update(ctx.unit_id, id, body).await?;
    if deactivating {
        state
            .auth_service()
            .revoke_all_sessions(ctx.unit_id, id)
            .await?;
    }
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "staff.updated",
            "staff",
            member.id,
            format!("Staff member {} updated", member.name),
        ))
        .await;
    Ok(Json(member))
}

fn cannot_deactivate_self() -> GymError {
    GymError::Conflict {
        message: "you cannot deactivate your own account".into(),
    }
}

/// Deactivates the member and revokes every session they hold.
async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.require_owner()?;
    if id == ctx.staff_id {
        return Err(cannot_deactivate_self().into());
    }
    state.staff().delete(ctx.unit_id, id).await?;
    state
        .auth_service()
        .revoke_all_sessions(ctx.unit_id, id)
        .await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "staff.deactivated",
            "staff",
            id,
            "Staff member deactivated",
        ))
        .await;
    Ok(StatusCode::NO_CONTENT)
}
