//! SurrealDB implementation of [`ContractRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::contract::{Contract, ContractStatus, CreateContract, UpdateContract};
use gymdesk_core::repository::ContractRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{first, opt_str, parse_enum, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct ContractRow {
    record_id: String,
    unit_id: String,
    lead_id: String,
    plan_id: Option<String>,
    body: String,
    status: String,
    signed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ContractRow {
    fn try_into_contract(self) -> Result<Contract, DbError> {
        Ok(Contract {
            id: parse_uuid(&self.record_id, "contract")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_uuid(&self.lead_id, "lead")?,
            plan_id: parse_opt_uuid(self.plan_id, "plan")?,
            body: self.body,
            status: parse_enum(&self.status)?,
            signed_at: self.signed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('contract', $id) \
                          WHERE unit_id = $unit_id";

/// SurrealDB implementation of the contract repository.
#[derive(Clone)]
pub struct SurrealContractRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealContractRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ContractRepository for SurrealContractRepository<C> {
    async fn create(&self, input: CreateContract) -> GymResult<Contract> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('contract', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, plan_id = $plan_id, \
                 body = $body, status = $status; {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", input.lead_id.to_string()))
            .bind(("plan_id", opt_str(input.plan_id)))
            .bind(("body", input.body))
            .bind(("status", ContractStatus::Draft.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("contract", e))?;

        let rows: Vec<ContractRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "contract", id)?.try_into_contract()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<Contract> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ContractRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "contract", id)?.try_into_contract()?)
    }

    async fn update(&self, unit_id: Uuid, id: Uuid, input: UpdateContract) -> GymResult<Contract> {
        let mut sets = Vec::new();
        if input.body.is_some() {
            sets.push("body = $body");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.signed_at.is_some() {
            sets.push("signed_at = $signed_at");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('contract', $id) SET {} WHERE unit_id = $unit_id; {SELECT_ONE}",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()));
        if let Some(body) = input.body {
            builder = builder.bind(("body", body));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }
        if let Some(signed_at) = input.signed_at {
            builder = builder.bind(("signed_at", signed_at));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("contract", e))?;

        let rows: Vec<ContractRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "contract", id)?.try_into_contract()?)
    }

    async fn list_by_lead(&self, unit_id: Uuid, lead_id: Uuid) -> GymResult<Vec<Contract>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM contract \
                 WHERE unit_id = $unit_id AND lead_id = $lead_id \
                 ORDER BY created_at DESC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("lead_id", lead_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ContractRow> = result.take(0).map_err(DbError::from)?;
        let contracts = rows
            .into_iter()
            .map(ContractRow::try_into_contract)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(contracts)
    }
}
