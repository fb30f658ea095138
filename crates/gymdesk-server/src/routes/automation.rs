use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use gymdesk_core::models::automation::{
    AutomationLog, AutomationRule, CreateAutomationRule, UpdateAutomationRule,
};
use gymdesk_core::repository::PaginatedResult;
use gymdesk_services::{LoggingSender, RunSummary};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::PageQuery;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/automation/rules", get(list).post(create))
        .route(
            "/automation/rules/:id",
            get(fetch).patch(update).delete(remove),
        )
        .route("/automation/run", post(run_now))
        .route("/automation/logs", get(logs))
}

#[derive(Debug, Default, Deserialize)]
struct RunBody {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    rule_id: Option<Uuid>,
}

async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Json<Vec<AutomationRule>>> {
    let rules = state
        .automation(LoggingSender)
        .list_rules(ctx.unit_id)
        .await?;
    Ok(Json(rules))
}

async fn create(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateAutomationRule>,
) -> ApiResult<(StatusCode, Json<AutomationRule>)> {
    ctx.require_owner()?;
    body.unit_id = ctx.unit_id;
    let rule = state.automation(LoggingSender).create_rule(body).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn fetch(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AutomationRule>> {
    Ok(Json(
        state.automation(LoggingSender).get_rule(ctx.unit_id, id).await?,
    ))
}

async fn update(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateAutomationRule>,
) -> ApiResult<Json<AutomationRule>> {
    ctx.require_owner()?;
    let rule = state
        .automation(LoggingSender)
        .update_rule(ctx.unit_id, id, body)
        .await?;
    Ok(Json(rule))
}

async fn remove(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.require_owner()?;
    state
        .automation(LoggingSender)
        .delete_rule(ctx.unit_id, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the unit's rules immediately instead of waiting for the sweep.
/// Messages already logged for the day are not sent again.
async fn run_now(
    State(state): State<AppState>,
    ctx: AuthContext,
    body: Option<Json<RunBody>>,
) -> ApiResult<Json<RunSummary>> {
    ctx.require_owner()?;
    let today = body
        .and_then(|Json(b)| b.date)
        .unwrap_or_else(|| Utc::now().date_naive());
    let unit = state.unit(ctx.unit_id).await?;
    let snapshot = state.snapshot(unit).await?;
    let summary = state.automation(LoggingSender).run(&snapshot, today).await?;
    info!(unit_id = %ctx.unit_id, staff_id = %ctx.staff_id, %today, "manual automation run");
    Ok(Json(summary))
}

async fn logs(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<LogQuery>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<AutomationLog>>> {
    let logs = state
        .automation(LoggingSender)
        .logs(ctx.unit_id, query.rule_id, page.pagination())
        .await?;
    Ok(Json(logs))
}
