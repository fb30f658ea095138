//! SurrealDB implementation of [`InvoiceRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::invoice::{
    CreateInvoice, Invoice, InvoiceFilter, InvoiceStatus, PaymentMethod, UpdateInvoice,
};
use gymdesk_core::repository::{InvoiceRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{
    CountRow, date_str, first, opt_str, parse_date, parse_enum, parse_opt_uuid, parse_uuid,
    total,
};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct InvoiceRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    subscription_id: Option<String>,
    description: String,
    amount_cents: i64,
    discount_cents: i64,
    due_date: String,
    status: String,
    paid_at: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn try_into_invoice(self) -> Result<Invoice, DbError> {
        Ok(Invoice {
            id: parse_uuid(&self.record_id, "invoice")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            subscription_id: parse_opt_uuid(self.subscription_id, "subscription")?,
            description: self.description,
            amount_cents: self.amount_cents,
            discount_cents: self.discount_cents,
            due_date: parse_date(&self.due_date, "due")?,
            status: parse_enum(&self.status)?,
            paid_at: self.paid_at,
            payment_method: self.payment_method.as_deref().map(parse_enum).transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('invoice', $id) \
                          WHERE unit_id = $unit_id";

fn filter_clause(filter: &InvoiceFilter) -> String {
    let mut conditions = vec!["unit_id = $unit_id"];
    if filter.status.is_some() {
        conditions.push("status = $status");
    }
    if filter.lead_id.is_some() {
        conditions.push("lead_id = $lead_id");
    }
    if filter.due_from.is_some() {
        conditions.push("due_date >= $due_from");
    }
    if filter.due_to.is_some() {
        conditions.push("due_date <= $due_to");
    }
    if filter.paid_from.is_some() {
        conditions.push("paid_at >= $paid_from");
    }
    if filter.paid_to.is_some() {
        conditions.push("paid_at < $paid_to");
    }
    conditions.join(" AND ")
}

/// SurrealDB implementation of the invoice repository.
#[derive(Clone)]
pub struct SurrealInvoiceRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealInvoiceRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> InvoiceRepository for SurrealInvoiceRepository<C> {
    async fn create(&self, input: CreateInvoice) -> GymResult<Invoice> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('invoice', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, \
                 subscription_id = $subscription_id, description = $description, \
                 amount_cents = $amount_cents, discount_cents = $discount_cents, \
                 due_date = $due_date, status = $status; {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("subscription_id", opt_str(input.subscription_id)))
            .bind(("description", input.description))
            .bind(("amount_cents", input.amount_cents))
            .bind(("discount_cents", input.discount_cents))
            .bind(("due_date", date_str(input.due_date)))
            .bind(("status", InvoiceStatus::Pending.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("invoice", e))?;

        let rows: Vec<InvoiceRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "invoice", id)?.try_into_invoice()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Invoice> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<InvoiceRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "invoice", id)?.try_into_invoice()?)
    }

    async fn update(&self, unit_id: Uuid, id: Uuid, input: UpdateInvoice) -> GymResult<Invoice> {
        let mut sets = Vec::new();
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.amount_cents.is_some() {
            sets.push("amount_cents = $amount_cents");
        }
        if input.discount_cents.is_some() {
            sets.push("discount_cents = $discount_cents");
        }
        if input.due_date.is_some() {
            sets.push("due_date = $due_date");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('invoice', $id) SET {} WHERE unit_id = $unit_id; {SELECT_ONE}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(amount) = input.amount_cents {
            builder = builder.bind(("amount_cents", amount));
        }
        if let Some(discount) = input.discount_cents {
            builder = builder.bind(("discount_cents", discount));
        }
        if let Some(due_date) = input.due_date {
            builder = builder.bind(("due_date", date_str(due_date)));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("invoice", e))?;

        let rows: Vec<InvoiceRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "invoice", id)?.try_into_invoice()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('invoice', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        unit_id: Uuid,
        filter: InvoiceFilter,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<Invoice>> {
        let clause = filter_clause(&filter);
        let query = format!(
            "SELECT count() AS total FROM invoice WHERE {clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM invoice WHERE {clause} \
             ORDER BY due_date ASC LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(status) = filter.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(lead_id) = filter.lead_id {
            builder = builder.bind(("lead_id", lead_id.to_string()));
        }
        if let Some(from) = filter.due_from {
            builder = builder.bind(("due_from", date_str(from)));
        }
        if let Some(to) = filter.due_to {
            builder = builder.bind(("due_to", date_str(to)));
        }
        if let Some(from) = filter.paid_from {
            builder = builder.bind(("paid_from", from));
        }
        if let Some(to) = filter.paid_to {
            builder = builder.bind(("paid_to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<InvoiceRow> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(InvoiceRow::try_into_invoice)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn mark_paid(
        &self,
        unit_id: Uuid,
        id: Uuid,
        method: PaymentMethod,
        paid_at: DateTime<Utc>,
    ) -> GymResult<Invoice> {
        let result = self
            .db
            .query(format!(
                "UPDATE type::record('invoice', $id) SET \
                 status = $status, payment_method = $method, paid_at = $paid_at, \
                 updated_at = time::now() WHERE unit_id = $unit_id; {SELECT_ONE}"
            ))
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .bind(("status", InvoiceStatus::Paid.as_str()))
            .bind(("method", method.as_str()))
            .bind(("paid_at", paid_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("invoice", e))?;

        let rows: Vec<InvoiceRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "invoice", id)?.try_into_invoice()?)
    }
}
