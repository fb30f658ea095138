use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::appointment::{Appointment, CreateAppointment, UpdateAppointment};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(agenda).post(create))
        .route("/appointments/:id", get(fetch).patch(update).delete(remove))
        .route("/appointments/:id/cancel", post(cancel))
}

#[derive(Debug, Deserialize)]
struct AgendaQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    staff_id: Option<Uuid>,
}

async fn agenda(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<AgendaQuery>,
) -> ApiResult<Json<Vec<Appointment>>> {
    if query.from >= query.to {
        return Err(GymError::validation("`from` must be before `to`").into());
    }
    let appointments = state
        .schedule()
        .agenda(ctx.unit_id, query.staff_id, query.from, query.to)
        .await?;
    Ok(Json(appointments))
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateAppointment>,
) -> ApiResult<(StatusCode, Json<Appointment>)> {
    body.unit_id = ctx.unit_id;
    let appointment = state.schedule().create(Some(ctx.staff_id), body).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Appointment>> {
    Ok(Json(state.schedule().get(ctx.unit_id, id).await?))
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAppointment>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state
        .schedule()
        .update(ctx.unit_id, Some(ctx.staff_id), id, body)
        .await?;
    Ok(Json(appointment))
}

async fn cancel(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Appointment>> {
    let appointment = state
        .schedule()
        .cancel(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(Json(appointment))
}

async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .schedule()
        .delete(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
