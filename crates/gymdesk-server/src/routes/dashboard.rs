use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use gymdesk_services::Dashboard;
use serde::Deserialize;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

#[derive(Debug, Deserialize)]
struct DashboardQuery {
    date: Option<NaiveDate>,
}

async fn dashboard(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Json<Dashboard>> {
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(state.reports().dashboard(ctx.unit_id, today).await?))
}
