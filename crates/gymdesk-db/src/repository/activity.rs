//! SurrealDB implementation of [`ActivityLogRepository`].
//!
//! The activity log is append-only: the trait exposes no update or
//! delete, and the table denies both at the permission level.

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::activity::{ActivityFilter, ActivityLog, CreateActivityLog};
use gymdesk_core::repository::{ActivityLogRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, first, opt_str, parse_opt_uuid, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    record_id: String,
    unit_id: String,
    actor_id: Option<String>,
    action: String,
    entity_type: String,
    entity_id: Option<String>,
    description: String,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl ActivityRow {
    fn try_into_activity(self) -> Result<ActivityLog, DbError> {
        Ok(ActivityLog {
            id: parse_uuid(&self.record_id, "activity")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            actor_id: parse_opt_uuid(self.actor_id, "actor")?,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: parse_opt_uuid(self.entity_id, "entity")?,
            description: self.description,
            metadata: self.metadata,
            created_at: self.created_at,
        })
    }
}

fn filter_clause(filter: &ActivityFilter) -> String {
    let mut conditions = vec!["unit_id = $unit_id"];
    if filter.entity_type.is_some() {
        conditions.push("entity_type = $entity_type");
    }
    if filter.entity_id.is_some() {
        conditions.push("entity_id = $entity_id");
    }
    if filter.actor_id.is_some() {
        conditions.push("actor_id = $actor_id");
    }
    if filter.from.is_some() {
        conditions.push("created_at >= $from");
    }
    if filter.to.is_some() {
        conditions.push("created_at < $to");
    }
    conditions.join(" AND ")
}

/// SurrealDB implementation of the activity log repository.
#[derive(Clone)]
pub struct SurrealActivityLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ActivityLogRepository for SurrealActivityLogRepository<C> {
    async fn append(&self, input: CreateActivityLog) -> GymResult<ActivityLog> {
        let id = Uuid::new_v4().to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('activity_log', $id) SET \
                 unit_id = $unit_id, actor_id = $actor_id, action = $action, \
                 entity_type = $entity_type, entity_id = $entity_id, \
                 description = $description, metadata = $metadata; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('activity_log', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("actor_id", opt_str(input.actor_id)))
            .bind(("action", input.action))
            .bind(("entity_type", input.entity_type))
            .bind(("entity_id", opt_str(input.entity_id)))
            .bind(("description", input.description))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("activity_log", e))?;

        let rows: Vec<ActivityRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "activity_log", id)?.try_into_activity()?)
    }

    async fn list(
        &self,
        unit_id: Uuid,
        filter: ActivityFilter,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<ActivityLog>> {
        let clause = filter_clause(&filter);
        let query = format!(
            "SELECT count() AS total FROM activity_log WHERE {clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM activity_log WHERE {clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(entity_type) = filter.entity_type {
            builder = builder.bind(("entity_type", entity_type));
        }
        if let Some(entity_id) = filter.entity_id {
            builder = builder.bind(("entity_id", entity_id.to_string()));
        }
        if let Some(actor_id) = filter.actor_id {
            builder = builder.bind(("actor_id", actor_id.to_string()));
        }
        if let Some(from) = filter.from {
            builder = builder.bind(("from", from));
        }
        if let Some(to) = filter.to {
            builder = builder.bind(("to", to));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<ActivityRow> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(ActivityRow::try_into_activity)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
