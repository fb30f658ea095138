//! Chat rooms and messages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    pub enum SenderKind {
        Staff,
        Lead,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: Uuid,
    pub unit_id: Uuid,
    /// Set for one-to-one conversations with a member.
    pub lead_id: Option<Uuid>,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatRoom {
    /// Set from the caller's unit by the API layer.
    #[serde(default)]
    pub unit_id: Uuid,
    pub lead_id: Option<Uuid>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: Uuid,
    pub unit_id: Uuid,
    pub room_id: Uuid,
    pub sender_kind: SenderKind,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChatMessage {
    pub unit_id: Uuid,
    pub room_id: Uuid,
    pub sender_kind: SenderKind,
    pub sender_id: Uuid,
    pub body: String,
}
