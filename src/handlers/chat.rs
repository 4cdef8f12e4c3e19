use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, Sse};
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};
use tokio_stream::StreamExt;
use uuid::Uuid;

use super::{ok, required};
use crate::db::queries;
use crate::errors::{AppError, AppResult};
use crate::models::ChatMessage;
use crate::services::auth;
use crate::state::AppState;

/// Messages kept per conversation read.
const HISTORY_LIMIT: i64 = 100;
const MAX_MESSAGE_CHARS: usize = 2000;

// POST /chat/messages
#[derive(Deserialize)]
pub struct SendMessageRequest {
    pub recipient_id: Option<String>,
    pub content: Option<String>,
}

pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let recipient_id = required(body.recipient_id.as_deref(), "recipient_id")?.to_string();
    let content = required(body.content.as_deref(), "content")?.to_string();
    if recipient_id == claims.user_id {
        return Err(AppError::Validation("cannot message yourself".to_string()));
    }
    if content.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }

    let message = {
        let mut db = state.db()?;
        if queries::get_user_by_id(&db, &recipient_id)?.is_none() {
            return Err(AppError::NotFound("recipient".to_string()));
        }
        let tx = db.transaction()?;
        let chat = queries::get_or_create_chat(&tx, &claims.user_id, &recipient_id)?;
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            chat_id: chat.id,
            sender_id: claims.user_id.clone(),
            recipient_id,
            content,
            created_at: Utc::now().naive_utc(),
        };
        queries::insert_message(&tx, &message)?;
        tx.commit()?;
        // Invalidate before releasing the connection so a concurrent read
        // cannot store the pre-insert history after this point.
        state
            .chat_cache
            .invalidate(&message.sender_id, &message.recipient_id);
        message
    };

    // No receivers is fine.
    let _ = state.chat_tx.send(message.clone());

    tracing::debug!(chat_id = %message.chat_id, sender_id = %message.sender_id, "chat message sent");
    Ok((StatusCode::CREATED, ok(message)))
}

// GET /chat/conversations
pub async fn conversations(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;
    let chats = {
        let db = state.db()?;
        queries::list_chats_for_user(&db, &claims.user_id)?
    };
    Ok(ok(chats))
}

// GET /chat/messages/:other_user_id
pub async fn messages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(other_user_id): Path<String>,
) -> AppResult<Json<Value>> {
    let claims = auth::authenticate(&headers, &state.config.jwt_secret)?;

    if let Some(cached) = state.chat_cache.get(&claims.user_id, &other_user_id) {
        tracing::debug!(user_id = %claims.user_id, other_user_id = %other_user_id, "chat history cache hit");
        return Ok(ok(cached));
    }

    // Fill under the connection lock so the write path's invalidation is
    // ordered after any fill that read older rows.
    let history = {
        let db = state.db()?;
        let history =
            queries::get_messages_between(&db, &claims.user_id, &other_user_id, HISTORY_LIMIT)?;
        state
            .chat_cache
            .put(&claims.user_id, &other_user_id, history.clone());
        history
    };
    Ok(ok(history))
}

// GET /chat/events (SSE stream)
#[derive(Deserialize)]
pub struct ChatEventsQuery {
    pub token: Option<String>,
}

pub async fn events_stream(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChatEventsQuery>,
) -> AppResult<Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>>> {
    // EventSource cannot set headers, so the session token rides in the query.
    let token = query.token.as_deref().unwrap_or("");
    let claims = auth::decode_session_token(token, &state.config.jwt_secret)?;
    let user_id = claims.user_id;

    let rx = state.chat_tx.subscribe();
    let live_stream = BroadcastStream::new(rx).filter_map(move |result| match result {
        Ok(message) if message.sender_id == user_id || message.recipient_id == user_id => {
            let data = serde_json::to_string(&message).unwrap_or_default();
            Some(Ok::<_, Infallible>(
                Event::default().data(data).event("chat_message"),
            ))
        }
        Ok(_) => None,
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::debug!(skipped, "chat subscriber lagged");
            None
        }
    });

    let keepalive_stream = IntervalStream::new(tokio::time::interval(Duration::from_secs(30)))
        .map(|_| Ok::<_, Infallible>(Event::default().comment("keepalive")));

    Ok(Sse::new(StreamExt::merge(live_stream, keepalive_stream)))
}
