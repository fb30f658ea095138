//! SurrealDB implementations of [`PlanRepository`] and
//! [`SubscriptionRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::plan::{
    CreatePlan, CreateSubscription, Plan, Subscription, SubscriptionStatus, UpdatePlan,
    UpdateSubscription,
};
use gymdesk_core::repository::{PlanRepository, SubscriptionRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{date_str, first, parse_date, parse_enum, parse_opt_date, parse_uuid};
use crate::error::DbError;

// -----------------------------------------------------------------------
// Plans
// -----------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct PlanRow {
    record_id: String,
    unit_id: String,
    name: String,
    description: Option<String>,
    price_cents: i64,
    billing_months: u32,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PlanRow {
    fn try_into_plan(self) -> Result<Plan, DbError> {
        Ok(Plan {
            id: parse_uuid(&self.record_id, "plan")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            name: self.name,
            description: self.description,
            price_cents: self.price_cents,
            billing_months: self.billing_months,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_PLAN: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('plan', $id) \
                           WHERE unit_id = $unit_id";

/// SurrealDB implementation of the plan repository.
#[derive(Clone)]
pub struct SurrealPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> PlanRepository for SurrealPlanRepository<C> {
    async fn create(&self, input: CreatePlan) -> GymResult<Plan> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('plan', $id) SET \
                 unit_id = $unit_id, name = $name, description = $description, \
                 price_cents = $price_cents, billing_months = $billing_months, \
                 active = true; {SELECT_PLAN}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("price_cents", input.price_cents))
            .bind(("billing_months", input.billing_months))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("plan", e))?;

        let rows: Vec<PlanRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "plan", id)?.try_into_plan()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Plan> {
        let mut result = self
            .db
            .query(SELECT_PLAN)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "plan", id)?.try_into_plan()?)
    }

    async fn update(&self, unit_id: Uuid, id: Uuid, input: UpdatePlan) -> GymResult<Plan> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.price_cents.is_some() {
            sets.push("price_cents = $price_cents");
        }
        if input.billing_months.is_some() {
            sets.push("billing_months = $billing_months");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('plan', $id) SET {} WHERE unit_id = $unit_id; {SELECT_PLAN}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(price_cents) = input.price_cents {
            builder = builder.bind(("price_cents", price_cents));
        }
        if let Some(billing_months) = input.billing_months {
            builder = builder.bind(("billing_months", billing_months));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("plan", e))?;

        let rows: Vec<PlanRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "plan", id)?.try_into_plan()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('plan', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, unit_id: Uuid, active_only: bool) -> GymResult<Vec<Plan>> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM plan \
             WHERE unit_id = $unit_id AND active = true ORDER BY name ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM plan \
             WHERE unit_id = $unit_id ORDER BY name ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let plans = rows
            .into_iter()
            .map(PlanRow::try_into_plan)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(plans)
    }
}

// -----------------------------------------------------------------------
// Subscriptions
// -----------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct SubscriptionRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    plan_id: String,
    price_cents: i64,
    billing_months: u32,
    starts_on: String,
    ends_on: Option<String>,
    next_billing_on: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRow {
    fn try_into_subscription(self) -> Result<Subscription, DbError> {
        Ok(Subscription {
            id: parse_uuid(&self.record_id, "subscription")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            plan_id: parse_uuid(&self.plan_id, "plan")?,
            price_cents: self.price_cents,
            billing_months: self.billing_months,
            starts_on: parse_date(&self.starts_on, "start")?,
            ends_on: parse_opt_date(self.ends_on, "end")?,
            next_billing_on: parse_date(&self.next_billing_on, "next billing")?,
            status: parse_enum(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn collect(rows: Vec<SubscriptionRow>) -> Result<Vec<Subscription>, DbError> {
    rows.into_iter()
        .map(SubscriptionRow::try_into_subscription)
        .collect()
}

const SELECT_SUBSCRIPTION: &str = "SELECT meta::id(id) AS record_id, * \
                                   FROM type::record('subscription', $id) \
                                   WHERE unit_id = $unit_id";

/// SurrealDB implementation of the subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn select(
        &self,
        query: &'static str,
        unit_id: Uuid,
        binds: Vec<(&'static str, String)>,
    ) -> Result<Vec<Subscription>, DbError> {
        let mut builder = self.db.query(query).bind(("unit_id", unit_id.to_string()));
        for bind in binds {
            builder = builder.bind(bind);
        }
        let mut result = builder.await?;
        let rows: Vec<SubscriptionRow> = result.take(0)?;
        collect(rows)
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn create(&self, input: CreateSubscription) -> GymResult<Subscription> {
        let id = Uuid::new_v4().to_string();
        let starts_on = date_str(input.starts_on);

        let result = self
            .db
            .query(format!(
                "CREATE type::record('subscription', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, plan_id = $plan_id, \
                 price_cents = $price_cents, billing_months = $billing_months, \
                 starts_on = $starts_on, ends_on = $ends_on, \
                 next_billing_on = $starts_on, status = $status; \
                 {SELECT_SUBSCRIPTION}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("plan_id", input.plan_id.to_string()))
            .bind(("price_cents", input.price_cents))
            .bind(("billing_months", input.billing_months))
            .bind(("starts_on", starts_on))
            .bind(("ends_on", input.ends_on.map(date_str)))
            .bind(("status", SubscriptionStatus::Active.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("subscription", e))?;

        let rows: Vec<SubscriptionRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "subscription", id)?.try_into_subscription()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Subscription> {
        let rows = self
            .select(SELECT_SUBSCRIPTION, unit_id, vec![("id", id.to_string())])
            .await?;
        Ok(first(rows, "subscription", id)?)
    }

    async fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateSubscription,
    ) -> GymResult<Subscription> {
        let mut sets = Vec::new();
        if input.price_cents.is_some() {
            sets.push("price_cents = $price_cents");
        }
        if input.ends_on.is_some() {
            sets.push("ends_on = $ends_on");
        }
        if input.next_billing_on.is_some() {
            sets.push("next_billing_on = $next_billing_on");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('subscription', $id) SET {} WHERE unit_id = $unit_id; \
             {SELECT_SUBSCRIPTION}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(price_cents) = input.price_cents {
            builder = builder.bind(("price_cents", price_cents));
        }
        if let Some(ends_on) = input.ends_on {
            builder = builder.bind(("ends_on", date_str(ends_on)));
        }
        if let Some(next) = input.next_billing_on {
            builder = builder.bind(("next_billing_on", date_str(next)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("subscription", e))?;

        let rows: Vec<SubscriptionRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "subscription", id)?.try_into_subscription()?)
    }

    async fn list_by_lead(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<Vec<Subscription>> {
        Ok(self
            .select(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY starts_on DESC",
                unit_id,
                vec![("lead_id", lead_id.to_string())],
            )
            .await?)
    }

    async fn list_active(&self, unit_id: Uuid) -> GymResult<Vec<Subscription>> {
        Ok(self
            .select(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE unit_id = $unit_id AND status = 'Active' \
                 ORDER BY next_billing_on ASC",
                unit_id,
                Vec::new(),
            )
            .await?)
    }

    async fn list_due_for_billing(
        &self,
        unit_id: Uuid,
        on: NaiveDate,
    ) -> GymResult<Vec<Subscription>> {
        Ok(self
            .select(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE unit_id = $unit_id AND status = 'Active' \
                 AND next_billing_on <= $on \
                 ORDER BY next_billing_on ASC",
                unit_id,
                vec![("on", date_str(on))],
            )
            .await?)
    }
}
