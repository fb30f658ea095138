//! SurrealDB implementation of [`ChatRepository`].

use chrono::{DateTime, Utc};
use gymdesk_core::error::GymResult;
use gymdesk_core::models::chat::{ChatMessage, ChatRoom, CreateChatMessage, CreateChatRoom};
use gymdesk_core::repository::ChatRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::support::{first, opt_str, parse_enum, parse_opt_uuid, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct RoomRow {
    record_id: String,
    unit_id: String,
    lead_id: Option<String>,
    name: String,
    created_at: DateTime<Utc>,
}

impl RoomRow {
    fn try_into_room(self) -> Result<ChatRoom, DbError> {
        Ok(ChatRoom {
            id: parse_uuid(&self.record_id, "chat room")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            lead_id: parse_opt_uuid(self.lead_id, "lead")?,
            name: self.name,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct MessageRow {
    record_id: String,
    unit_id: String,
    room_id: String,
    sender_kind: String,
    sender_id: String,
    body: String,
    created_at: DateTime<Utc>,
}

impl MessageRow {
    fn try_into_message(self) -> Result<ChatMessage, DbError> {
        Ok(ChatMessage {
            id: parse_uuid(&self.record_id, "chat message")?,
            unit_id: parse_uuid(&self.unit_id, "unit")?,
            room_id: parse_uuid(&self.room_id, "chat room")?,
            sender_kind: parse_enum(&self.sender_kind)?,
            sender_id: parse_uuid(&self.sender_id, "sender")?,
            body: self.body,
            created_at: self.created_at,
        })
    }
}

const SELECT_ROOM: &str = "SELECT meta::id(id) AS record_id, * FROM type::record('chat_room', $id) \
                           WHERE unit_id = $unit_id";

/// SurrealDB implementation of the chat repository.
#[derive(Clone)]
pub struct SurrealChatRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChatRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChatRepository for SurrealChatRepository<C> {
    async fn create_room(&self, input: CreateChatRoom) -> GymResult<ChatRoom> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(format!(
                "CREATE type::record('chat_room', $id) SET \
                 unit_id = $unit_id, lead_id = $lead_id, name = $name; {SELECT_ROOM}"
            ))
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("lead_id", opt_str(input.lead_id)))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("chat_room", e))?;

        let rows: Vec<RoomRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "chat_room", id)?.try_into_room()?)
    }

    async fn get_room(&self, unit_id: Uuid, id: Uuid) -> GymResult<ChatRoom> {
        let mut result = self
            .db
            .query(SELECT_ROOM)
            .bind(("id", id.to_string()))
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        Ok(first(rows, "chat_room", id)?.try_into_room()?)
    }

    async fn list_rooms(&self, unit_id: Uuid) -> GymResult<Vec<ChatRoom>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM chat_room \
                 WHERE unit_id = $unit_id ORDER BY created_at DESC",
            )
            .bind(("unit_id", unit_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoomRow> = result.take(0).map_err(DbError::from)?;
        let rooms = rows
            .into_iter()
            .map(RoomRow::try_into_room)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(rooms)
    }

    async fn post_message(&self, input: CreateChatMessage) -> GymResult<ChatMessage> {
        let id = Uuid::new_v4().to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('chat_message', $id) SET \
                 unit_id = $unit_id, room_id = $room_id, \
                 sender_kind = $sender_kind, sender_id = $sender_id, body = $body; \
                 SELECT meta::id(id) AS record_id, * \
                 FROM type::record('chat_message', $id)",
            )
            .bind(("id", id.clone()))
            .bind(("unit_id", input.unit_id.to_string()))
            .bind(("room_id", input.room_id.to_string()))
            .bind(("sender_kind", input.sender_kind.as_str()))
            .bind(("sender_id", input.sender_id.to_string()))
            .bind(("body", input.body))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::statement("chat_message", e))?;

        let rows: Vec<MessageRow> = result.take(1).map_err(DbError::from)?;
        Ok(first(rows, "chat_message", id)?.try_into_message()?)
    }

    async fn list_messages(
        &self,
        unit_id: Uuid,
        room_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> GymResult<Vec<ChatMessage>> {
        let query = if after.is_some() {
            "SELECT meta::id(id) AS record_id, * FROM chat_message \
             WHERE unit_id = $unit_id AND room_id = $room_id AND created_at > $after \
             ORDER BY created_at ASC"
        } else {
            "SELECT meta::id(id) AS record_id, * FROM chat_message \
             WHERE unit_id = $unit_id AND room_id = $room_id \
             ORDER BY created_at ASC"
        };

        let mut builder = self
            .db
            .query(query)
            .bind(("unit_id", unit_id.to_string()))
            .bind(("room_id", room_id.to_string()));
        if let Some(after) = after {
            builder = builder.bind(("after", after));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<MessageRow> = result.take(0).map_err(DbError::from)?;
        let messages = rows
            .into_iter()
            .map(MessageRow::try_into_message)
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(messages)
    }
}
