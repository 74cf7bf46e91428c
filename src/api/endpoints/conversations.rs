//! `GET /api/conversations/:id/messages`: stored messages, oldest first.

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ConversationMessagesResponse, MessageView};
use crate::db::{MessageStore, SqliteStore};

pub async fn messages(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ConversationMessagesResponse>, ApiError> {
    let conversation_id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("Invalid conversation id: {id}")))?;

    let messages = tokio::task::spawn_blocking(move || -> Result<_, ApiError> {
        let conn = ctx.open_db()?;
        let store = SqliteStore::new(&conn);
        if store.find_conversation(&conversation_id)?.is_none() {
            return Err(ApiError::NotFound("Conversation not found".into()));
        }
        Ok(store.list_messages(&conversation_id)?)
    })
    .await??;

    Ok(Json(ConversationMessagesResponse {
        conversation_id,
        messages: messages.into_iter().map(MessageView::from).collect(),
    }))
}
