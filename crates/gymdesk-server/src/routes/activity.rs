use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use gymdesk_core::models::activity::{ActivityFilter, ActivityLog};
use gymdesk_core::repository::{ActivityLogRepository, PaginatedResult};

use super::PageQuery;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/activity", get(list))
}

async fn list(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(filter): Query<ActivityFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<ActivityLog>>> {
    let entries = state
        .activity_repo()
        .list(ctx.unit_id, filter, page.pagination())
        .await?;
    Ok(Json(entries))
}
