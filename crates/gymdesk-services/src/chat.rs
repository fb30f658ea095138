//! Realtime chat: persisted rooms and messages, fanned out to connected
//! clients through a per-unit broadcast channel.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::chat::{
    ChatMessage, ChatRoom, CreateChatMessage, CreateChatRoom, SenderKind,
};
use gymdesk_core::repository::ChatRepository;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 256;

/// Broadcast hub with one channel per unit. Subscribers receive every
/// message posted in their unit and filter by room themselves.
#[derive(Clone)]
pub struct ChatHub {
    channels: Arc<DashMap<Uuid, broadcast::Sender<ChatMessage>>>,
    capacity: usize,
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl ChatHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(DashMap::new()),
            capacity: capacity.max(1),
        }
    }

    fn sender(&self, unit_id: Uuid) -> broadcast::Sender<ChatMessage> {
        self.channels
            .entry(unit_id)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    pub fn subscribe(&self, unit_id: Uuid) -> broadcast::Receiver<ChatMessage> {
        self.sender(unit_id).subscribe()
    }

    /// Deliver to current subscribers, returning how many received it.
    /// Nobody listening is not an error.
    pub fn publish(&self, message: ChatMessage) -> usize {
        let unit_id = message.unit_id;
        let delivered = self.sender(unit_id).send(message).unwrap_or(0);
        debug!(%unit_id, delivered, "chat message published");
        delivered
    }

    /// Drop channels nobody listens to any more.
    pub fn prune(&self) {
        self.channels.retain(|_, tx| tx.receiver_count() > 0);
    }
}

/// Client-side view of a room's messages. Incoming messages are appended
/// unless a message with the same id is already present; nothing else
/// about ordering is guaranteed.
#[derive(Debug, Clone, Default)]
pub struct MessageBuffer {
    messages: Vec<ChatMessage>,
}

impl MessageBuffer {
    pub fn new(history: Vec<ChatMessage>) -> Self {
        let mut buffer = Self::default();
        for message in history {
            buffer.push(message);
        }
        buffer
    }

    /// Returns whether the message was appended.
    pub fn push(&mut self, message: ChatMessage) -> bool {
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.messages.push(message);
        true
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct ChatService<R: ChatRepository> {
    repo: R,
    hub: ChatHub,
}

impl<R: ChatRepository> ChatService<R> {
    pub fn new(repo: R, hub: ChatHub) -> Self {
        Self { repo, hub }
    }

    pub fn hub(&self) -> &ChatHub {
        &self.hub
    }

    pub async fn create_room(&self, input: CreateChatRoom) -> GymResult<ChatRoom> {
        if input.name.trim().is_empty() {
            return Err(GymError::validation("room name is required"));
        }
        self.repo.create_room(input).await
    }

    pub async fn rooms(&self, unit_id: Uuid) -> GymResult<Vec<ChatRoom>> {
        self.repo.list_rooms(unit_id).await
    }

    /// Persist, then publish. Only stored messages are ever broadcast.
    pub async fn post(
        &self,
        unit_id: Uuid,
        room_id: Uuid,
        sender_kind: SenderKind,
        sender_id: Uuid,
        body: String,
    ) -> GymResult<ChatMessage> {
        let body = body.trim().to_string();
        if body.is_empty() {
            return Err(GymError::validation("message is empty"));
        }
        // Room must exist in this unit.
        self.repo.get_room(unit_id, room_id).await?;

        let message = self
            .repo
            .post_message(CreateChatMessage {
                unit_id,
                room_id,
                sender_kind,
                sender_id,
                body,
            })
            .await?;
        self.hub.publish(message.clone());
        Ok(message)
    }

    pub async fn history(
        &self,
        unit_id: Uuid,
        room_id: Uuid,
        after: Option<DateTime<Utc>>,
    ) -> GymResult<Vec<ChatMessage>> {
        self.repo.list_messages(unit_id, room_id, after).await
    }
}
