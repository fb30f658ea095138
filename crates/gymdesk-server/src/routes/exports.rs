//! Spreadsheet downloads. Every export takes `?format=csv|xlsx` next to
//! the listing filters of its resource.

use axum::extract::{Query, State};
use axum::http::HeaderValue;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use chrono::{Days, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::activity::ActivityFilter;
use gymdesk_core::models::invoice::InvoiceFilter;
use gymdesk_core::models::lead::LeadFilter;
use gymdesk_core::reporting::start_of_day;
use gymdesk_core::repository::{ActivityLogRepository, collect_pages};
use gymdesk_export::{ExportFormat, Tabular, export};
use serde::Deserialize;
use tracing::info;

use super::check_ins::DateRange;
use crate::auth::AuthContext;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/exports/leads", get(leads))
        .route("/exports/invoices", get(invoices))
        .route("/exports/check-ins", get(check_ins))
        .route("/exports/activity", get(activity))
}

#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    format: Option<ExportFormat>,
}

impl FormatQuery {
    fn format(&self) -> ExportFormat {
        self.format.unwrap_or(ExportFormat::Csv)
    }
}

fn download<T: Tabular>(
    ctx: &AuthContext,
    rows: &[T],
    format: ExportFormat,
    name: &str,
) -> ApiResult<Response> {
    let bytes = export(rows, format, name)?;
    let filename = format!(
        "{name}-{}.{}",
        Utc::now().date_naive(),
        format.extension()
    );
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ApiError(GymError::Internal(e.to_string())))?;
    info!(unit_id = %ctx.unit_id, export = name, rows = rows.len(), "export generated");
    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static(format.content_type())),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

async fn leads(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FormatQuery>,
    Query(filter): Query<LeadFilter>,
) -> ApiResult<Response> {
    let service = state.leads();
    let leads = collect_pages(|page| service.list(ctx.unit_id, filter.clone(), page)).await?;
    download(&ctx, &leads, query.format(), "leads")
}

async fn invoices(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FormatQuery>,
    Query(filter): Query<InvoiceFilter>,
) -> ApiResult<Response> {
    ctx.require_billing()?;
    let billing = state.billing();
    let invoices =
        collect_pages(|page| billing.list_invoices(ctx.unit_id, filter.clone(), page)).await?;
    download(&ctx, &invoices, query.format(), "faturas")
}

async fn check_ins(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FormatQuery>,
    Query(range): Query<DateRange>,
) -> ApiResult<Response> {
    let (from, to) = range.resolve(Utc::now().date_naive())?;
    let end = to
        .checked_add_days(Days::new(1))
        .ok_or_else(|| GymError::validation("date out of range"))?;
    let check_ins = state
        .check_ins()
        .between(ctx.unit_id, start_of_day(from), start_of_day(end))
        .await?;
    download(&ctx, &check_ins, query.format(), "check-ins")
}

async fn activity(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<FormatQuery>,
    Query(filter): Query<ActivityFilter>,
) -> ApiResult<Response> {
    ctx.require_owner()?;
    let repo = state.activity_repo();
    let entries = collect_pages(|page| repo.list(ctx.unit_id, filter.clone(), page)).await?;
    download(&ctx, &entries, query.format(), "atividades")
}
