//! SurrealDB implementation of [`StaffRepository`].
//!
//! Passwords are hashed with Argon2id (m = 19 MiB, t = 2, p = 1) and a
//! random salt per hash. An optional server-side pepper is prepended to
//! the password before hashing.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::staff::{CreateStaffMember, StaffMember, StaffStatus, UpdateStaffMember};
use gymdesk_core::repository::{PaginatedResult, Pagination, StaffRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, first, parse_enum, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct StaffRow {
    record_id: String,
    unit_id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StaffRow {
    fn try_into_staff(self) -> Result<StaffMember, DbError> {
        Ok(StaffMember {
            id: parse_uuid(&self.record_id, "staff")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: parse_enum(&self.role)?,
            status: parse_enum(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_ONE: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('staff', $id) \
                          WHERE unit_id = $unit_id";

/// Hash a password with Argon2id, prepending the pepper when present.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Query(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_string(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| DbError::Query(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the staff repository.
#[derive(Clone)]
pub struct SurrealStaffRepository<C: Connection> {
    db: Surreal<C>,
    pepper: Option<String>,
}

impl<C: Connection> SurrealStaffRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }
}

impl<C: Connection> StaffRepository for SurrealStaffRepository<C> {
    async fn create(&self, input: CreateStaffMember) -> GymResult<StaffMember> {
        let id = Uuid::new_v4().to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(format!(
                "CREATE type::record('staff', $id) SET \
                 unit_id = $unit_id, name = $name, email = $email, \
                 password_hash = $password_hash, role = $role, \
                 status = 'Active'; {SELECT_ONE}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("name", input.name))
            .bind(("email", input.email.trim().to_lowercase()))
            .bind(("password_hash", password_hash))
            .bind(("role", input.role.as_str()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("staff", e))?;

        let rows: Vec<StaffRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "staff", id)?.try_into_staff()?)
    }

    async fn get_by_id(&self, unit_id: Uuid, id: Uuid) -> GymResult<StaffMember> {
        let mut result = self
            .db
            .query(SELECT_ONE)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "staff", id)?.try_into_staff()?)
    }

    async fn get_by_email(&self, unit_id: Uuid, email: &str) -> GymResult<StaffMember> {
        let email = email.trim().to_lowercase();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff \
                 WHERE unit_id = $unit_id AND email = $email",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "staff", format!("email={email}"))?.try_into_staff()?)
    }

    async fn update(
        &self,
        unit_id: Uuid,
        id: Uuid,
        input: UpdateStaffMember,
    ) -> GymResult<StaffMember> {
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.email.is_some() {
            sets.push("email = $email");
        }
        if input.role.is_some() {
            sets.push("role = $role");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('staff', $id) SET {} WHERE unit_id = $unit_id; {SELECT_ONE}",
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
            builder = builder.bind(("email", email.trim().to_lowercase()));
        }
        if let Some(role) = input.role {
            builder = builder.bind(("role", role.as_str()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status.as_str()));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::statement("staff", e))?;

        let rows: Vec<StaffRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "staff", id)?.try_into_staff()?)
    }

    async fn delete(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query(
                "UPDATE type::record('staff', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE unit_id = $unit_id",
            )
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .bind(("status", StaffStatus::Inactive.as_str()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        unit_id: Uuid,
        pagination: Pagination,
    ) -> GymResult<PaginatedResult<StaffMember>> {
        let unit_id = unit_id.to_string();

        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM staff WHERE unit_id = $unit_id GROUP ALL")
            .bind(("unit_id", unit_id.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM staff \
                 WHERE unit_id = $unit_id \
                 ORDER BY name ASC LIMIT $limit START $offset",
            )
            .bind(("unit_id", unit_id))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<StaffRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(StaffRow::try_into_staff)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total: total(count_rows),
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
