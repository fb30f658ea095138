//! SurrealDB implementation of [`SessionRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::session::{CreateSession, Session};
use gymdesk_core::repository::SessionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{CountRow, first, parse_uuid, total};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    record_id: String,
    unit_id: String,
    staff_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn try_into_session(self) -> Result<Session, DbError> {
        Ok(Session {
            id: parse_uuid(&self.record_id, "session")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            staff_id: parse_uuid(&self.staff_id, "staff")?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, input: CreateSession) -> GymResult<Session> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 unit_id = $unit_id, staff_id = $staff_id, \
                 token_hash = $token_hash, ip_address = $ip_address, \
                 user_agent = $user_agent, expires_at = $expires_at; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('session', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("staff_id", input.staff_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("session", e))?;

        let rows: Vec<SessionRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "session", id)?.try_into_session()?)
    }

    async fn get_by_token_hash(&self, unit_id: Uuid, token_hash: &str) -> GymResult<Session> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM session \
                 WHERE unit_id = $unit_id AND token_hash = $token_hash",
            )
            .bind(("unit_id", unit_id.to_string()))
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "session", "token_hash")?.try_into_session()?)
    }

    async fn invalidate(&self, unit_id: Uuid, id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE type::record('session', $id) WHERE unit_id = $unit_id")
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn invalidate_staff_sessions(&self, unit_id: Uuid, staff_id: Uuid) -> GymResult<()> {
        self.db
            .query("DELETE session WHERE unit_id = $unit_id AND staff_id = $staff_id")
            .bind(("unit_id", unit_id.to_string()))
            .bind(("staff_id", staff_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn cleanup_expired(&self, unit_id: Uuid) -> GymResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM session \
                 WHERE unit_id = $unit_id AND expires_at < time::now() \
                 GROUP ALL",
            )
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;

        self.db
            .query("DELETE session WHERE unit_id = $unit_id AND expires_at < time::now()")
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(total(count_rows))
    }
}
