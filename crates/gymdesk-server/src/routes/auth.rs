use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gymdesk_auth::{LoginInput, LoginOutput, RefreshInput};
use gymdesk_core::error::GymError;
use gymdesk_core::models::staff::StaffMember;
use gymdesk_core::models::unit::Unit;
use gymdesk_core::repository::{StaffRepository, UnitRepository};
use serde::Deserialize;

use crate::auth::{AuthContext, ClientInfo};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    unit_slug: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    unit_slug: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
struct LogoutRequest {
    refresh_token: String,
}

/// An unknown unit fails exactly like a wrong password.
async fn unit_for_login(state: &AppState, slug: &str) -> ApiResult<Unit> {
    match state.units().get_by_slug(slug.trim()).await {
        Ok(unit) => Ok(unit),
        Err(GymError::NotFound { .. }) => Err(ApiError::unauthorized("invalid credentials")),
        Err(err) => Err(err.into()),
    }
}

async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(body): Json<LoginRequest>,
) -> ApiResult<Json<LoginOutput>> {
    let unit = unit_for_login(&state, &body.unit_slug).await?;
    let output = state
        .auth_service()
        .login(LoginInput {
            unit_id: unit.id,
            email: body.email,
            password: body.password,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await?;
    Ok(Json(output))
}

async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(body): Json<RefreshRequest>,
) -> ApiResult<Json<LoginOutput>> {
    let unit = unit_for_login(&state, &body.unit_slug).await?;
    let output = state
        .auth_service()
        .refresh(RefreshInput {
            unit_id: unit.id,
            raw_refresh_token: body.refresh_token,
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
        .await?;
    Ok(Json(output))
}

async fn logout(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<LogoutRequest>,
) -> ApiResult<StatusCode> {
    state
        .auth_service()
        .logout_with_refresh_token(ctx.unit_id, &body.refresh_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn logout_all(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<StatusCode> {
    state
        .auth_service()
        .revoke_all_sessions(ctx.unit_id, ctx.staff_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<Json<StaffMember>> {
    let staff = state.staff().get_by_id(ctx.unit_id, ctx.staff_id).await?;
    Ok(Json(staff))
}
