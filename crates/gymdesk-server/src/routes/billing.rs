//! Plans, subscriptions and invoices. Reads are open to every role;
//! writes need billing rights.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, Utc};
use gymdesk_core::error::GymError;
use gymdesk_core::models::invoice::{
    CreateInvoice, Invoice, InvoiceFilter, PaymentMethod, UpdateInvoice,
};
use gymdesk_core::models::plan::{CreatePlan, Plan, Subscription, UpdatePlan, UpdateSubscription};
use gymdesk_core::repository::{PaginatedResult, PlanRepository};
use gymdesk_services::activity::Activity;
use gymdesk_services::billing::receipt;
use serde::Deserialize;
use uuid::Uuid;

use super::PageQuery;
use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans).post(create_plan))
        .route(
            "/plans/:id",
            get(fetch_plan).patch(update_plan).delete(remove_plan),
        )
        .route("/subscriptions", post(subscribe))
        .route("/subscriptions/:id", patch(update_subscription))
        .route("/leads/:id/subscriptions", get(subscriptions_of))
        .route("/invoices", get(list_invoices).post(create_invoice))
        .route(
            "/invoices/:id",
            get(fetch_invoice).patch(update_invoice).delete(remove_invoice),
        )
        .route("/invoices/:id/pay", post(pay))
        .route("/invoices/:id/cancel", post(cancel))
        .route("/invoices/:id/receipt", get(invoice_receipt))
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PlanQuery {
    #[serde(default)]
    active_only: bool,
}

fn check_plan_values(price_cents: Option<i64>, billing_months: Option<u32>) -> Result<(), GymError> {
    if price_cents.is_some_and(|p| p < 0) {
        return Err(GymError::validation("price must not be negative"));
    }
    if billing_months.is_some_and(|m| !(1..=12).contains(&m)) {
        return Err(GymError::validation("billing period must be 1 to 12 months"));
    }
    Ok(())
}

async fn list_plans(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<PlanQuery>,
) -> ApiResult<Json<Vec<Plan>>> {
    Ok(Json(state.plans().list(ctx.unit_id, query.active_only).await?))
}

async fn create_plan(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreatePlan>,
) -> ApiResult<(StatusCode, Json<Plan>)> {
    ctx.require_billing()?;
    if body.name.trim().is_empty() {
        return Err(GymError::validation("plan name is required").into());
    }
    check_plan_values(Some(body.price_cents), Some(body.billing_months))?;
    body.unit_id = ctx.unit_id;

    let plan = state.plans().create(body).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "plan.created",
            "plan",
            plan.id,
            format!("Plan {} created", plan.name),
        ))
        .await;
    Ok((StatusCode::CREATED, Json(plan)))
}

async fn fetch_plan(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Plan>> {
    Ok(Json(state.plans().get_by_id(ctx.unit_id, id).await?))
}

async fn update_plan(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdatePlan>,
) -> ApiResult<Json<Plan>> {
    ctx.require_billing()?;
    check_plan_values(body.price_cents, body.billing_months)?;
    let plan = state.plans().update(ctx.unit_id, id, body).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "plan.updated",
            "plan",
            plan.id,
            format!("Plan {} updated", plan.name),
        ))
        .await;
    Ok(Json(plan))
}

async fn remove_plan(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.require_billing()?;
    state.plans().delete(ctx.unit_id, id).await?;
    state
        .activity()
        .record(Activity::new(
            ctx.unit_id,
            Some(ctx.staff_id),
            "plan.deleted",
            "plan",
            id,
            "Plan deleted",
        ))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Subscriptions
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SubscribeBody {
    lead_id: Uuid,
    plan_id: Uuid,
    starts_on: Option<NaiveDate>,
}

async fn subscribe(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(body): Json<SubscribeBody>,
) -> ApiResult<(StatusCode, Json<Subscription>)> {
    ctx.require_billing()?;
    let starts_on = body.starts_on.unwrap_or_else(|| Utc::now().date_naive());
    let subscription = state
        .billing()
        .subscribe(
            ctx.unit_id,
            Some(ctx.staff_id),
            body.lead_id,
            body.plan_id,
            starts_on,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(subscription)))
}

async fn subscriptions_of(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(lead_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Subscription>>> {
    Ok(Json(
        state.billing().subscriptions_of(ctx.unit_id, lead_id).await?,
    ))
}

async fn update_subscription(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateSubscription>,
) -> ApiResult<Json<Subscription>> {
    ctx.require_billing()?;
    let subscription = state
        .billing()
        .update_subscription(ctx.unit_id, Some(ctx.staff_id), id, body)
        .await?;
    Ok(Json(subscription))
}

// ---------------------------------------------------------------------------
// Invoices
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct PayBody {
    method: PaymentMethod,
    paid_at: Option<DateTime<Utc>>,
}

async fn list_invoices(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(filter): Query<InvoiceFilter>,
    Query(page): Query<PageQuery>,
) -> ApiResult<Json<PaginatedResult<Invoice>>> {
    let invoices = state
        .billing()
        .list_invoices(ctx.unit_id, filter, page.pagination())
        .await?;
    Ok(Json(invoices))
}

async fn create_invoice(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateInvoice>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    ctx.require_billing()?;
    body.unit_id = ctx.unit_id;
    let invoice = state
        .billing()
        .create_invoice(Some(ctx.staff_id), body)
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

async fn fetch_invoice(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invoice>> {
    Ok(Json(state.billing().get_invoice(ctx.unit_id, id).await?))
}

async fn update_invoice(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateInvoice>,
) -> ApiResult<Json<Invoice>> {
    ctx.require_billing()?;
    let invoice = state
        .billing()
        .update_invoice(ctx.unit_id, Some(ctx.staff_id), id, body)
        .await?;
    Ok(Json(invoice))
}

async fn remove_invoice(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    ctx.require_billing()?;
    state
        .billing()
        .delete_invoice(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn pay(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
    Json(body): Json<PayBody>,
) -> ApiResult<Json<Invoice>> {
    ctx.require_billing()?;
    let invoice = state
        .billing()
        .mark_paid(
            ctx.unit_id,
            Some(ctx.staff_id),
            id,
            body.method,
            body.paid_at.unwrap_or_else(Utc::now),
        )
        .await?;
    Ok(Json(invoice))
}

async fn cancel(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Invoice>> {
    ctx.require_billing()?;
    let invoice = state
        .billing()
        .cancel_invoice(ctx.unit_id, Some(ctx.staff_id), id)
        .await?;
    Ok(Json(invoice))
}

async fn invoice_receipt(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let invoice = state.billing().get_invoice(ctx.unit_id, id).await?;
    let lead = state.leads().get(ctx.unit_id, invoice.lead_id).await?;
    let unit = state.unit(ctx.unit_id).await?;
    let text = receipt(&unit, &lead, &invoice)?;
    Ok(([(CONTENT_TYPE, "text/plain; charset=utf-8")], text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_values_are_bounded() {
        assert!(check_plan_values(Some(12_990), Some(1)).is_ok());
        assert!(check_plan_values(None, None).is_ok());
        assert!(check_plan_values(Some(0), Some(12)).is_ok());
        assert!(check_plan_values(Some(-1), None).is_err());
        assert!(check_plan_values(None, Some(0)).is_err());
        assert!(check_plan_values(None, Some(13)).is_err());
    }
}
