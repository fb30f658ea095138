//! SurrealDB implementation of [`AppointmentRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::appointment::{
    Appointment, AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use gymdesk_core::repository::AppointmentRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{first, opt_str, parse_enum, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct AppointmentRow {
    record_id: String,
    unit_id: String,
    lead_id: Option<String>,
    staff_id: Option<String>,
    title: String,
    kind: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AppointmentRow {
    fn try_into_appointment(self) -> Result<Appointment, DbError> {
        Ok(Appointment {
            id: parse_uuid(&self.record_id, "appointment")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_opt_uuid(self.lead_id, "lead")?,
            staff_id: parse_opt_uuid(self.staff_id, "staff")?,
            title: self.title,
            kind: parse_enum(&self.kind)?,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
            status: parse_enum(&self.status)?,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn collect(rows: Vec<AppointmentRow>) -> Result<Vec<Appointment>, DbError> {
    rows.into_iter()
        .map(AppointmentRow::try_into_appointment)
        .collect()
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * \
                          FROM type::record('appointment', $id) WHERE unit_id = $unit_id";

/// SurrealDB implementation of the appointment repository.
#[derive(Clone)]
pub struct SurrealAppointmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAppointmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AppointmentRepository for SurrealAppointmentRepository<C> {
    async fn create(&self, input: CreateAppointment) -> GymResult<Appointment> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('appointment', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, staff_id = $staff_id, \
                 title = $title, kind = $kind, starts_at = $starts_at, \
                 ends_at = $ends_at, status = $status, notes = $notes; \
                 {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", opt_str(input.lead_id)))
            .bind(("staff_id", opt_str(input.staff_id)))
            .bind(("title", input.title))
            .bind(("kind", input.kind.as_str()))
            .bind(("starts_at", input.starts_at))
            .bind(("ends_at", input.ends_at))
            .bind(("status", AppointmentStatus::Scheduled.as_str()))
            .bind(("notes", input.notes))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("appointment", e))?;

        let rows: Vec<AppointmentRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "appointment", id)?.try_into_appointment()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Appointment> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "appointment", id)?.try_into_appointment()?)
    }

    async fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateAppointment,
    ) -> GymResult<Appointment> {
        let mut sets = Vec::new();
        if input.lead_id.is_some() {
            sets.push("lead_id = $lead_id");
        }
        if input.staff_id.is_some() {
            sets.push("staff_id = $staff_id");
        }
        if input.title.is_some() {
            sets.push("title = $title");
        }
        if input.kind.is_some() {
            sets.push("kind = $kind");
        }
        if input.starts_at.is_some() {
            sets.push("starts_at = $starts_at");
        }
        if input.ends_at.is_some() {
            sets.push("ends_at = $ends_at");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('appointment', $id) SET {} WHERE unit_id = $unit_id; \
             {SELECT_ONE}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(lead_id) = input.lead_id {
            builder = builder.bind(("lead_id", lead_id.to_string()));
        }
        if let Some(staff_id) = input.staff_id {
            builder = builder.bind(("staff_id", staff_id.to_string()));
        }
        if let Some(title) = input.title {
            builder = builder.bind(("title", title));
        }
        if let Some(kind) = input.kind {
            builder = builder.bind(("kind", kind.as_str()));
        }
        if let Some(starts_at) = input.starts_at {
            builder = builder.bind(("starts_at", starts_at));
        }
        if let Some(ends_at) = input.ends_at {
            builder = builder.bind(("ends_at", ends_at));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("appointment", e))?;

        let rows: Vec<AppointmentRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "appointment", id)?.try_into_appointment()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('appointment', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_between(
        &self,
        unit_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GymResult<Vec<Appointment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appointment \
                 WHERE unit_id = $unit_id AND starts_at >= $from AND starts_at < $to \
                 ORDER BY starts_at ASC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }

    async fn list_for_staff_between(
        &self,
        unit_id: Uuid,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GymResult<Vec<Appointment>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM appointment \
                 WHERE unit_id = $unit_id AND staff_id = $staff_id \
                 AND starts_at < $to AND ends_at > $from \
                 ORDER BY starts_at ASC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("staff_id", staff_id.to_string()))
            .bind(("from", from))
            .bind(("to", to))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AppointmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(collect(rows)?)
    }
}
