use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use gymdesk_core::models::check_in::CheckIn;
use gymdesk_core::models::lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead};
use gymdesk_core::repository::PaginatedResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PageQuery;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/leads", get(list).post(create))
        .route("/leads/:id", get(fetch).patch(update).delete(remove))
        .route("/leads/:id/status", put(change_status))
        .route("/leads/:id/qr", get(qr))
        .route("/leads/:id/check-ins", get(check_ins))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: LeadStatus,
}

#[derive(Debug, Serialize)]
struct QrResponse {
    lead_id: Uuid,
    payload: String,
}

async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(filter): Query<LeadFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Lead>>> {
    let leads = state
        .leads()
        .list(ctx.unit_id, filter, page.pagination())
        .await?;
    Ok(Json(leads))
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateLead>,
) -> ApiResult<(StatusCode, Json<Lead>)> {
    body.unit_id = ctx.unit_id;
    let lead = state.leads().create(Some(ctx.staff_id), body).await?;
    Ok((StatusCode::CREATED, Json(lead)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Lead>> {
    Ok(Json(state.leads().get(ctx.unit_id, id).await?))
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateLead>,
) -> ApiResult<Json<Lead>> {
    let lead = state
        .leads()
        .update(ctx.unit_id, Some(ctx.staff_id), id, body)
        .await?;
    Ok(Json(lead))
}

async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .leads()
        .delete(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn change_status(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Json<Lead>> {
    let lead = state
        .leads()
        .change_status(ctx.unit_id, Some(ctx.staff_id), id, body.status)
        .await?;
    Ok(Json(lead))
}

async fn qr(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<QrResponse>> {
    let payload = state.check_ins().qr_payload(ctx.unit_id, id).await?;
    Ok(Json(QrResponse {
        lead_id: id,
        payload,
    }))
}

async fn check_ins(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<CheckIn>>> {
    let history = state
        .check_ins()
        .history(ctx.unit_id, id, page.pagination())
        .await?;
    Ok(Json(history))
}
