use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gymdesk_core::models::contract::Contract;
use gymdesk_core::repository::PlanRepository;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contracts", post(draft))
        .route("/contracts/:id", get(fetch).patch(edit))
        .route("/contracts/:id/send", post(send))
        .route("/contracts/:id/sign", post(sign))
        .route("/contracts/:id/cancel", post(cancel))
        .route("/leads/:id/contracts", get(by_lead))
}

#[derive(Debug, Deserialize)]
struct DraftBody {
    lead_id: Uuid,
    /// Falls back to the lead's current plan.
    plan_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
struct EditBody {
    body: String,
}

async fn draft(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<DraftBody>,
) -> ApiResult<(StatusCode, Json<Contract>)> {
    let unit = state.unit(ctx.unit_id).await?;
    let lead = state.leads().get(ctx.unit_id, body.lead_id).await?;
    let plan = match body.plan_id.or(lead.plan_id) {
        Some(plan_id) => Some(state.plans().get_by_id(ctx.unit_id, plan_id).await?),
        None => None,
    };
    let contract = state
        .contracts()
        .draft(Some(ctx.staff_id), &unit, &lead, plan.as_ref())
        .await?;
    Ok((StatusCode::CREATED, Json(contract)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Contract>> {
    Ok(Json(state.contracts().get(ctx.unit_id, id).await?))
}

async fn by_lead(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Contract>>> {
    Ok(Json(
        state.contracts().list_by_lead(ctx.unit_id, lead_id).await?,
    ))
}

async fn edit(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<EditBody>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts()
        .edit(ctx.unit_id, Some(ctx.staff_id), id, body.body)
        .await?;
    Ok(Json(contract))
}

async fn send(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts()
        .mark_sent(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(Json(contract))
}

async fn sign(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts()
        .sign(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(Json(contract))
}

async fn cancel(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Contract>> {
    let contract = state
        .contracts()
        .cancel(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(Json(contract))
}
