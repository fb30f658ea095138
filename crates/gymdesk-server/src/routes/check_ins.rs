use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Days, NaiveDate, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::check_in::CheckIn;
use gymdesk_core::reporting::start_of_day;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

/// Longest range the listing endpoint returns in one call.
const MAX_RANGE_DAYS: i64 = 92;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/check-ins", get(between).post(manual))
        .route("/check-ins/qr", post(scan))
}

#[derive(Debug, Deserialize)]
struct ManualBody {
    lead_id: Uuid,
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ScanBody {
    payload: String,
}

/// Inclusive calendar range; both ends default to today.
#[derive(Debug, Deserialize)]
pub(super) struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn resolve(&self, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), GymError> {
        let to = self.to.unwrap_or(today);
        let from = self.from.unwrap_or(to);
        if from > to {
            return Err(GymError::validation("`from` must not be after `to`"));
        }
        if (to - from).num_days() > MAX_RANGE_DAYS {
            return Err(GymError::validation(format!(
                "range is limited to {MAX_RANGE_DAYS} days"
            )));
        }
        Ok((from, to))
    }
}

async fn manual(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<ManualBody>,
) -> ApiResult<(StatusCode, Json<CheckIn>)> {
    let check_in = state
        .check_ins()
        .manual(ctx.unit_id, Some(ctx.staff_id), body.lead_id, body.notes)
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

async fn scan(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<ScanBody>,
) -> ApiResult<(StatusCode, Json<CheckIn>)> {
    let check_in = state
        .check_ins()
        .scan(ctx.unit_id, Some(ctx.staff_id), &body.payload, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(check_in)))
}

async fn between(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(range): Query<DateRange>,
) -> ApiResult<Json<Vec<CheckIn>>> {
    let (from, to) = range.resolve(Utc::now().date_naive())?;
    let end = to
        .checked_add_days(Days::new(1))
        .ok_or_else(|| GymError::validation("date out of range"))?;
    let check_ins = state
        .check_ins()
        .between(ctx.unit_id, start_of_day(from), start_of_day(end))
        .await?;
    Ok(Json(check_ins))
}
