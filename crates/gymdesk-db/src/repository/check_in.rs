//! SurrealDB implementation of [`CheckInRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::check_in::{CheckIn, CreateCheckIn};
use gymdesk_core::repository::{CheckInRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, first, parse_enum, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CheckInRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    method: String,
    checked_in_at: DateTime<Utc>,
    notes: Option<String>,
}

impl CheckInRow {
    fn try_into_check_in(self) -> Result<CheckIn, DbError> {
        Ok(CheckIn {
            id: parse_uuid(&self.record_id, "check-in")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            method: parse_enum(&self.method)?,
            checked_in_at: self.checked_in_at,
            notes: self.notes,
        })
    }
}

fn collect(rows: Vec<CheckInRow>) -> Result<Vec<CheckIn>, DbError> {
    rows.into_iter().map(CheckInRow::try_into_check_in).collect()
}

/// SurrealDB implementation of the check-in repository.
#[derive(Clone)]
pub struct SurrealCheckInRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCheckInRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CheckInRepository for SurrealCheckInRepository<C> {
    async fn create(&self, input: CreateCheckIn) -> GymResult<CheckIn> {
        let id = Uuid::new_v4().to_string();
        let checked_in_at = input.checked_in_at.unwrap_or_else(Utc::now);

        let result = self
            .db
            .query(
                "CREATE type::record('check_in', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, method = $method, \
                 checked_in_at = $checked_in_at, notes = $notes; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('check_in', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("method", input.method.as_str()))
            .bind(("checked_in_at", checked_in_at))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("check_in", e))?;

        let rows: Vec<CheckInRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "check_in", id)?.try_into_check_in()?)
    }

    async fn list_by_lead(
        &self,
        unit_id: Uuid,
        lead_id: Uuid,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<CheckIn>> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM check_in \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id GROUP ALL; \
                 SELECT meta::id(id) AS record_id, * FROM check_in \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY checked_in_at DESC LIMIT $limit START $offset",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<CheckInRow> = result.take(1).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: collect(rows)?,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_between(
        &self,
        unit_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GymResult<Vec<CheckIn>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM check_in \
                 WHERE unit_id = $unit_id \
                 AND checked_in_at >= $from AND checked_in_at < $to \
                 ORDER BY checked_in_at ASC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CheckInRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn last_for_lead(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<Option<CheckIn>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM check_in \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY checked_in_at DESC LIMIT 1",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CheckInRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .next()
            .map(CheckInRow::try_into_check_in)
            .transpose()?)
    }
}
