//! SurrealDB implementations of [`AutomationRuleRepository`] and
//! [`AutomationLogRepository`].
//!
//! The log table is append-only and carries a unique index on
//! `(rule_id, lead_id, run_date)`, so a rule fires at most once per lead
//! and day even when two sweeps overlap.

use chrono::{DateTime, NaiveDate, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::automation::{
    AutomationLog, AutomationRule, CreateAutomationLog, CreateAutomationRule,
    UpdateAutomationRule,
};
use gymdesk_core::repository::{
    AutomationLogRepository, AutomationRuleRepository, PaginatedResult, Pagination,
};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, date_str, first, parse_date, parse_enum, parse_uuid, total};
use crate::error::DbError;

// -----------------------------------------------------------------------
// Rules
// -----------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct RuleRow {
    record_id: String,
    unit_id: String,
    name: String,
    trigger_type: String,
    day_offset: i64,
    channel: String,
    template: String,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RuleRow {
    fn try_into_rule(self) -> Result<AutomationRule, DbError> {
        Ok(AutomationRule {
            id: parse_uuid(&self.record_id, "automation rule")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            name: self.name,
            trigger: parse_enum(&self.trigger_type)?,
            day_offset: i32::try_from(self.day_offset)
                .map_err(|e| DbError::Corrupt(format!("day offset out of range: {e}")))?,
            channel: parse_enum(&self.channel)?,
            template: self.template,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_RULE: &str = "SELECT meta::id(id) AS record_id, * \
                           FROM type::record('automation_rule', $id) \
                           WHERE unit_id = $unit_id";

/// SurrealDB implementation of the automation rule repository.
#[derive(Clone)]
pub struct SurrealAutomationRuleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAutomationRuleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AutomationRuleRepository for SurrealAutomationRuleRepository<C> {
    async fn create(&self, input: CreateAutomationRule) -> GymResult<AutomationRule> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('automation_rule', $id) SET \
                 unit_id = $unit_id, name = $name, trigger_type = $trigger_type, \
                 day_offset = $day_offset, channel = $channel, \
                 template = $template, active = true; {SELECT_RULE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("name", input.name))
            .bind(("trigger_type", input.trigger.as_str()))
            .bind(("day_offset", i64::from(input.day_offset)))
            .bind(("channel", input.channel.as_str()))
            .bind(("template", input.template))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("automation_rule", e))?;

        let rows: Vec<RuleRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "automation_rule", id)?.try_into_rule()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<AutomationRule> {
        let mut result = self
            .db
            .query(SELECT_RULE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "automation_rule", id)?.try_into_rule()?)
    }

    async fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateAutomationRule,
    ) -> GymResult<AutomationRule> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.trigger.is_some() {
            sets.push("trigger_type = $trigger_type");
        }
        if input.day_offset.is_some() {
            sets.push("day_offset = $day_offset");
        }
        if input.channel.is_some() {
            sets.push("channel = $channel");
        }
        if input.template.is_some() {
            sets.push("template = $template");
        }
        if input.active.is_some() {
            sets.push("active = $active");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('automation_rule', $id) SET {} WHERE unit_id = $unit_id; \
             {SELECT_RULE}",
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
        if let Some(trigger) = input.trigger {
            builder = builder.bind(("trigger_type", trigger.as_str()));
        }
        if let Some(offset) = input.day_offset {
            builder = builder.bind(("day_offset", i64::from(offset)));
        }
        if let Some(channel) = input.channel {
            builder = builder.bind(("channel", channel.as_str()));
        }
        if let Some(template) = input.template {
            builder = builder.bind(("template", template));
        }
        if let Some(active) = input.active {
            builder = builder.bind(("active", active));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("automation_rule", e))?;

        let rows: Vec<RuleRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "automation_rule", id)?.try_into_rule()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('automation_rule', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, unit_id: Uuid, active_only: bool) -> GymResult<Vec<AutomationRule>> {
        let query = if active_only {
            "SELECT meta::id(id) AS record_id, * FROM automation_rule \
             WHERE unit_id = $unit_id AND active = true ORDER BY name ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM automation_rule \
             WHERE unit_id = $unit_id ORDER BY name ASC"
        };

        let mut result = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RuleRow> = result.take(0).map_err(DbError::from)?;
        let rules = rows
            .into_iter()
            .map(RuleRow::try_into_rule)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(rules)
    }
}

// -----------------------------------------------------------------------
// Delivery log
// -----------------------------------------------------------------------

#[derive(Debug, SurrealValue)]
struct LogRow {
    record_id: String,
    unit_id: String,
    rule_id: String,
    lead_id: String,
    run_date: String,
    channel: String,
    message: String,
    status: String,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl LogRow {
    fn try_into_log(self) -> Result<AutomationLog, DbError> {
        Ok(AutomationLog {
            id: parse_uuid(&self.record_id, "automation log")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            rule_id: parse_uuid(&self.rule_id, "automation rule")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            run_date: parse_date(&self.run_date, "run")?,
            channel: parse_enum(&self.channel)?,
            message: self.message,
            status: parse_enum(&self.status)?,
            error: self.error,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the automation log repository.
#[derive(Clone)]
pub struct SurrealAutomationLogRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAutomationLogRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AutomationLogRepository for SurrealAutomationLogRepository<C> {
    async fn append(&self, input: CreateAutomationLog) -> GymResult<AutomationLog> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('automation_log', $id) SET \
                 unit_id = $unit_id, rule_id = $rule_id, lead_id = $lead_id, \
                 run_date = $run_date, channel = $channel, message = $message, \
                 status = $status, error = $error; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('automation_log', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("rule_id", input.rule_id.to_string()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("run_date", date_str(input.run_date)))
            .bind(("channel", input.channel.as_str()))
            .bind(("message", input.message))
            .bind(("status", input.status.as_str()))
            .bind(("error", input.error))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("automation_log", e))?;

        let rows: Vec<LogRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "automation_log", id)?.try_into_log()?)
    }

    async fn exists_for(
        &self,
        unit_id: Uuid,
        rule_id: Uuid,
        lead_id: Uuid,
        run_date: NaiveDate,
    ) -> GymResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM automation_log \
                 WHERE unit_id = $unit_id AND rule_id = $rule_id \
                 AND lead_id = $lead_id AND run_date = $run_date GROUP ALL",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("rule_id", rule_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .bind(("run_date", date_str(run_date)))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(total(rows) > 0)
    }

    async fn list(
        &self,
        unit_id: Uuid,
        rule_id: Option<Uuid>,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<AutomationLog>> {
        let clause = if rule_id.is_some() {
            "unit_id = $unit_id AND rule_id = $rule_id"
        } else {
            "unit_id = $unit_id"
        };
        let query = format!(
            "SELECT count() AS total FROM automation_log WHERE {clause} GROUP ALL; \
             SELECT meta::id(id) AS record_id, * FROM automation_log WHERE {clause} \
             ORDER BY created_at DESC LIMIT $limit START $offset"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(rule_id) = rule_id {
            builder = builder.bind(("rule_id", rule_id.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        let rows: Vec<LogRow> = result.take(1).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(LogRow::try_into_log)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
