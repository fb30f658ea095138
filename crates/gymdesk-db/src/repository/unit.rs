//! SurrealDB implementation of [`UnitRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::unit::{CreateUnit, DEFAULT_PRIMARY_COLOR, Unit, UpdateUnit};
use gymdesk_core::repository::{PaginatedResult, Pagination, UnitRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, first, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct UnitRow {
    record_id: String,
    name: String,
    slug: String,
    cnpj: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    address: Option<String>,
    primary_color: String,
    logo_url: Option<String>,
    contract_template: Option<String>,
    metadata: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UnitRow {
    fn try_into_unit(self) -> Result<Unit, DbError> {
        Ok(Unit {
            id: parse_uuid(&self.record_id, "unit")?,
            name: self.name,
            slug: self.slug,
            cnpj: self.cnpj,
            phone: self.phone,
            email: self.email,
            address: self.address,
            primary_color: self.primary_color,
            logo_url: self.logo_url,
            contract_template: self.contract_template,
            metadata: self.metadata,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('unit', $id)";

/// SurrealDB implementation of the Unit repository.
#[derive(Clone)]
pub struct SurrealUnitRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealUnitRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> UnitRepository for SurrealUnitRepository<C> {
    async fn create(&self, input: CreateUnit) -> GymResult<Unit> {
        let id = Uuid::new_v4().to_string();
        let metadata = input
            .metadata
            .unwrap_or(serde_json::Value::Object(Default::default()));
        let primary_color = input
            .primary_color
            .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string());

        let result = self
            .db
            .query(format!(
                "CREATE type::record('unit', $id) SET \
                 name = $name, slug = $slug, cnpj = $cnpj, \
                 phone = $phone, email = $email, address = $address, \
                 primary_color = $primary_color, metadata = $metadata; \
                 {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("cnpj", input.cnpj))
            .bind(("phone", input.phone))
            .bind(("email", input.email))
            .bind(("address", input.address))
            .bind(("primary_color", primary_color))
            .bind(("metadata", metadata))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("unit", e))?;

        let rows: Vec<UnitRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "unit", id)?.try_into_unit()?)
    }

    async fn get_by_id(&self, id: Uuid) -> GymResult<Unit> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "unit", id)?.try_into_unit()?)
    }

    async fn get_by_slug(&self, slug: &str) -> GymResult<Unit> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM unit WHERE slug = $slug")
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "unit", format!("slug={slug}"))?.try_into_unit()?)
    }

    async fn update(&self, id: Uuid, input: UpdateUnit) -> GymResult<Unit> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.cnpj.is_some() {
            sets.push("cnpj = $cnpj");
        }
        if input.phone.is_some() {
            sets.push("phone = $phone");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.primary_color.is_some() {
            sets.push("primary_color = $primary_color");
        }
        if input.logo_url.is_some() {
            sets.push("logo_url = $logo_url");
        }
        if input.contract_template.is_some() {
            sets.push("contract_template = $contract_template");
        }
        if input.metadata.is_some() {
            sets.push("metadata = $metadata");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('unit', $id) SET {}; {SELECT_ONE}",
            sets.join(", ")
        );

        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(cnpj) = input.cnpj {
            builder = builder.bind(("cnpj", cnpj));
        }
        if let Some(phone) = input.phone {
            builder = builder.bind(("phone", phone));
        }
        if let Some(email) = input.email {
            builder = builder.bind(("email", email));
        }
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(color) = input.primary_color {
            builder = builder.bind(("primary_color", color));
        }
        if let Some(logo_url) = input.logo_url {
            builder = builder.bind(("logo_url", logo_url));
        }
        if let Some(template) = input.contract_template {
            builder = builder.bind(("contract_template", template));
        }
        if let Some(metadata) = input.metadata {
            builder = builder.bind(("metadata", metadata));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("unit", e))?;

        let rows: Vec<UnitRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "unit", id)?.try_into_unit()?)
    }

    async fn delete(&self, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('unit', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> GymResult<PaginatedResult<Unit>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM unit GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM unit \
                 ORDER BY name ASC LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UnitRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(UnitRow::try_into_unit)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
