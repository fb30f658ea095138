//! Membership plan and subscription domain models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable membership offer (e.g., monthly, quarterly, annual).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Price charged once per billing period, in cents.
    pub price_cents: i64,
    /// Length of one billing period in months.
    pub billing_months: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub billing_months: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdatePlan {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub billing_months: Option<u32>,
    pub active: Option<bool>,
}

text_enum! {
    pub enum SubscriptionStatus {
        Active,
        Paused,
        Cancelled,
        Expired,
    }
}

/// A lead enrolled in a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub plan_id: Uuid,
    /// Price locked at enrollment, in cents per billing period.
    pub price_cents: i64,
    pub billing_months: u32,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
    /// Due date of the next invoice to be generated.
    pub next_billing_on: NaiveDate,
    pub status: SubscriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub unit_id: Uuid,
    pub lead_id: Uuid,
    pub plan_id: Uuid,
    pub price_cents: i64,
    pub billing_months: u32,
    pub starts_on: NaiveDate,
    pub ends_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSubscription {
    pub price_cents: Option<i64>,
    pub ends_on: Option<NaiveDate>,
    pub next_billing_on: Option<NaiveDate>,
    pub status: Option<SubscriptionStatus>,
}
