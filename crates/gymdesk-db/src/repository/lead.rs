//! SurrealDB implementation of [`LeadRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::mask::only_digits;
use gymdesk_core::models::lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead};
use gymdesk_core::repository::{LeadRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{
    CountRow, date_str, first, opt_str, parse_enum, parse_opt_date, parse_opt_uuid, parse_uuid,
    total,
};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct LeadRow {
    record_id: String,
    unit_id: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    cpf: Option<String>,
    birth_date: Option<String>,
    sex: Option<String>,
    source: Option<String>,
    status: String,
    plan_id: Option<String>,
    assigned_to: Option<String>,
    notes: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadRow {
    fn try_into_lead(self) -> Result<Lead, DbError> {
        Ok(Lead {
            id: parse_uuid(&self.record_id, "lead")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            cpf: self.cpf,
            birth_date: parse_opt_date(self.birth_date, "birth")?,
            sex: self.sex.as_deref().map(parse_enum).transpose()?,
            source: self.source,
            status: parse_enum(&self.status)?,
            plan_id: parse_opt_uuid(self.plan_id, "plan")?,
            assigned_to: parse_opt_uuid(self.assigned_to, "staff")?,
            notes: self.notes,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct StatusCountRow {
    status: String,
    total: u64,
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('lead', $id) \
                          WHERE unit_id = $unit_id";

/// SurrealDB implementation of the Lead repository.
#[derive(Clone)]
pub struct SurrealLeadRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLeadRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

/// WHERE clause for a lead filter; the caller binds `$unit_id` and the
/// parameters named here.
fn filter_clause(filter: &LeadFilter, search_digits: &str) -> String {
    let mut conditions = vec!["unit_id = $unit_id"];
    if filter.status.is_some() {
        conditions.push("status = $status");
    }
    if filter.assigned_to.is_some() {
        conditions.push("assigned_to = $assigned_to");
    }
    if filter.search.is_some() {
        if search_digits.is_empty() {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(email ?? ''), $search))",
            );
        } else {
            conditions.push(
                "(string::contains(string::lowercase(name), $search) \
                 OR string::contains(string::lowercase(email ?? ''), $search) \
                 OR string::contains(phone ?? '', $search_digits) \
                 OR string::contains(cpf ?? '', $search_digits))",
            );
        }
    }
    conditions.join(" AND ")
}

impl<C: Connection> LeadRepository for SurrealLeadRepository<C> {
    async fn create(&self, input: CreateLead) -> GymResult<Lead> {
        let id = Uuid::new_v4().to_string();
        let status = input.status.unwrap_or(LeadStatus::Lead);

        let result = self
            .db
            .query(format!(
                "CREATE type::record('lead', $id) SET \
                 unit_id = $unit_id, name = $name, email = $email, \
                 phone = $phone, cpf = $cpf, birth_date = $birth_date, \
                 sex = $sex, source = $source, status = $status, \
                 plan_id = $plan_id, assigned_to = $assigned_to, \
                 notes = $notes, tags = $tags; {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email))
            .bind(("phone", input.phone))
            .bind(("cpf", input.cpf))
            .bind(("birth_date", input.birth_date.map(date_str)))
            .bind(("sex", opt_str(input.sex)))
            .bind(("source", input.source))
            .bind(("status", status.as_str()))
            .bind(("plan_id", opt_str(input.plan_id)))
            .bind(("assigned_to", opt_str(input.assigned_to)))
            .bind(("notes", input.notes))
            .bind(("tags", input.tags))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("lead", e))?;

        let rows: Vec<LeadRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "lead", id)?.try_into_lead()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Lead> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LeadRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "lead", id)?.try_into_lead()?)
    }

    async fn update(&self, unit_id: Uuid, id: Uuid, input: UpdateLead) -> GymResult<Lead> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.cpf.is_some() {
            sets.push("cpf = $cpf");
        }
        if input.birth_date.is_some() {
            sets.push("birth_date = $birth_date");
        }
        if input.sex.is_some() {
            sets.push("sex = $sex");
        }
        if input.source.is_some() {
            sets.push("source = $source");
        }
        if input.plan_id.is_some() {
            sets.push("plan_id = $plan_id");
        }
        if input.assigned_to.is_some() {
            sets.push("assigned_to = $assigned_to");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.tags.is_some() {
            sets.push("tags = $tags");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('lead', $id) SET {} WHERE unit_id = $unit_id; {SELECT_ONE}",
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
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(cpf) = input.cpf {
            builder = builder.bind(("cpf", cpf));
        }
        if let Some(birth_date) = input.birth_date {
            builder = builder.bind(("birth_date", date_str(birth_date)));
        }
        if let Some(sex) = input.sex {
            builder = builder.bind(("sex", sex.as_str()));
        }
        if let Some(source) = input.source {
            builder = builder.bind(("source", source));
        }
        if let Some(plan_id) = input.plan_id {
            builder = builder.bind(("plan_id", plan_id.to_string()));
        }
        if let Some(assigned_to) = input.assigned_to {
            builder = builder.bind(("assigned_to", assigned_to.to_string()));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(tags) = input.tags {
            builder = builder.bind(("tags", tags));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("lead", e))?;

        let rows: Vec<LeadRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "lead", id)?.try_into_lead()?)
    }

    async fn set_status(&self, unit_id: Uuid, id: Uuid, status: LeadStatus) -> GymResult<Lead> {
        let result = self
            .db
            .query(format!(
                "UPDATE type::record('lead', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE unit_id = $unit_id; {SELECT_ONE}"
            ))
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .bind(("status", status.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("lead", e))?;

        let rows: Vec<LeadRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "lead", id)?.try_into_lead()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('lead', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        unit_id: Uuid,
        filter: LeadFilter,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<Lead>> {
        let search = filter
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        let filter = LeadFilter {
            search: search.clone(),
            ..filter
        };
        let search_digits = search.as_deref().map(only_digits).unwrap_or_default();
        let clause = filter_clause(&filter, &search_digits);

        let query = format!(
            "SELECT count() AS total FROM lead WHERE {clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM lead WHERE {clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
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
        if let Some(assigned_to) = filter.assigned_to {
            builder = builder.bind(("assigned_to", assigned_to.to_string()));
        }
        if let Some(search) = search {
            builder = builder
                .bind(("search", search))
                .bind(("search_digits", search_digits));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<LeadRow> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(LeadRow::try_into_lead)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_by_status(&self, unit_id: Uuid) -> GymResult<Vec<(LeadStatus, u64)>> {
        let mut result = self
            .db
            .query(
                "SELECT status, count() AS total FROM lead \
                 WHERE unit_id = $unit_id GROUP BY status",
            )
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StatusCountRow> = result.take(0).map_err(DbError::from)?;
        let counts = rows
            .into_iter()
            .map(|row| Ok((parse_enum(&row.status)?, row.total)))
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_clause_includes_only_requested_conditions() {
        let clause = filter_clause(&LeadFilter::default(), "");
        assert_eq!(clause, "unit_id = $unit_id");

        let filter = LeadFilter {
            status: Some(LeadStatus::Active),
            search: Some("ana".into()),
            assigned_to: None,
        };
        let clause = filter_clause(&filter, "");
        assert!(clause.contains("status = $status"));
        assert!(clause.contains("$search"));
        assert!(!clause.contains("$search_digits"));

        let clause = filter_clause(&filter, "1199");
        assert!(clause.contains("$search_digits"));
    }
}
