use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use gymdesk_core::models::assessment::{AssessmentInput, PhysicalAssessment};
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assessments", post(create))
        .route("/assessments/:id", get(fetch).delete(remove))
        .route("/leads/:id/assessments", get(history))
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<AssessmentInput>,
) -> ApiResult<(StatusCode, Json<PhysicalAssessment>)> {
    body.unit_id = ctx.unit_id;
    state.leads().get(ctx.unit_id, body.lead_id).await?;
    let assessment = state.assessments().create(Some(ctx.staff_id), body).await?;
    Ok((StatusCode::CREATED, Json(assessment)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<PhysicalAssessment>> {
    Ok(Json(state.assessments().get(ctx.unit_id, id).await?))
}

async fn history(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<Vec<PhysicalAssessment>>> {
    Ok(Json(
        state.assessments().history(ctx.unit_id, lead_id).await?,
    ))
}

async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .assessments()
        .delete(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
