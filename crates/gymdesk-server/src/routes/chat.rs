use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use gymdesk_core::models::chat::{ChatMessage, ChatRoom, CreateChatRoom, SenderKind};
use serde::Deserialize;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/rooms", get(rooms).post(create_room))
        .route("/chat/rooms/:id/messages", get(history).post(post_message))
        .route("/chat/stream", get(stream))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    after: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MessageBody {
    body: String,
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    room_id: Option<Uuid>,
}

async fn rooms(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<Json<Vec<ChatRoom>>> {
    Ok(Json(state.chat().rooms(ctx.unit_id).await?))
}

async fn create_room(
    State(state): State<AppState>,
    ctx: AuthContext,
    Json(mut body): Json<CreateChatRoom>,
) -> ApiResult<(StatusCode, Json<ChatRoom>)> {
    body.unit_id = ctx.unit_id;
    if let Some(lead_id) = body.lead_id {
        state.leads().get(ctx.unit_id, lead_id).await?;
    }
    Ok((StatusCode::CREATED, Json(state.chat().create_room(body).await?)))
}

async fn history(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(room_id): Path<Uuid>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<ChatMessage>>> {
    let messages = state
        .chat()
        .history(ctx.unit_id, room_id, query.after)
        .await?;
    Ok(Json(messages))
}

async fn post_message(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(room_id): Path<Uuid>,
    Json(body): Json<MessageBody>,
) -> ApiResult<(StatusCode, Json<ChatMessage>)> {
    let message = state
        .chat()
        .post(
            ctx.unit_id,
            room_id,
            SenderKind::Staff,
            ctx.staff_id,
            body.body,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

fn to_event(
    item: Result<ChatMessage, BroadcastStreamRecvError>,
    room_id: Option<Uuid>,
) -> Option<Event> {
    match item {
        Ok(message) if room_id.is_none_or(|room| room == message.room_id) => Event::default()
            .event("message")
            .id(message.id.to_string())
            .json_data(&message)
            .ok(),
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "chat stream subscriber lagged");
            Some(Event::default().event("lagged").data(skipped.to_string()))
        }
    }
}

/// Server-sent events for every new message in the caller's unit,
/// optionally narrowed to one room. Clients that fall behind get a
/// `lagged` event and should reload history.
async fn stream(
    State(state): State<AppState>,
    ctx: AuthContext,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.chat_hub().subscribe(ctx.unit_id);
    let room_id = query.room_id;
    let events = BroadcastStream::new(receiver)
        .filter_map(move |item| futures::future::ready(to_event(item, room_id).map(Ok)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(room_id: Uuid) -> ChatMessage {
        ChatMessage {
            id: Uuid::new_v4(),
            unit_id: Uuid::new_v4(),
            room_id,
            sender_kind: SenderKind::Staff,
            sender_id: Uuid::new_v4(),
            body: "Oi".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn events_are_filtered_by_room() {
        let room = Uuid::new_v4();
        assert!(to_event(Ok(message(room)), Some(room)).is_some());
        assert!(to_event(Ok(message(room)), None).is_some());
        assert!(to_event(Ok(message(Uuid::new_v4())), Some(room)).is_none());
        assert!(to_event(Err(BroadcastStreamRecvError::Lagged(3)), Some(room)).is_some());
    }
}
