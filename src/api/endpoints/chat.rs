//! `POST /api/chat`: run one conversational turn.
//!
//! The client sends its whole visible history; the last user message is the
//! new turn and everything before it is prior context.

use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ChatMessageIn, ChatRequest, ChatResponse, ContentCard};
use crate::db::{SqliteStore, UnavailableStore};
use crate::models::enums::MessageRole;
use crate::models::ChatTurn;
use crate::pipeline::chat::{TurnOrchestrator, TurnOutcome, TurnRequest};
use crate::pipeline::triage::session_hash;

pub async fn send(
    State(ctx): State<ApiContext>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let turn = to_turn_request(req)?;

    let outcome = tokio::task::spawn_blocking(move || run_turn(&ctx, turn)).await??;

    Ok(Json(to_response(outcome)))
}

fn to_turn_request(req: ChatRequest) -> Result<TurnRequest, ApiError> {
    if req.session_id.trim().is_empty() {
        return Err(ApiError::BadRequest("sessionId is required".into()));
    }
    let (prior, message) = split_last_user(req.messages)?;

    Ok(TurnRequest {
        conversation_id: req.conversation_id,
        session_hash: session_hash(&req.session_id),
        prior_messages: prior,
        message,
    })
}

/// Split the client history at its last user message. Anything after it
/// is dropped.
fn split_last_user(mut messages: Vec<ChatMessageIn>) -> Result<(Vec<ChatTurn>, String), ApiError> {
    let last_user = messages
        .iter()
        .rposition(|m| m.role == MessageRole::User)
        .ok_or_else(|| ApiError::BadRequest("no user message to answer".into()))?;

    messages.truncate(last_user + 1);
    let new_message = messages.pop().map(|m| m.content).unwrap_or_default();
    let prior = messages
        .into_iter()
        .map(|m| ChatTurn {
            role: m.role,
            content: m.content,
        })
        .collect();
    Ok((prior, new_message))
}

fn run_turn(ctx: &ApiContext, turn: TurnRequest) -> Result<TurnOutcome, ApiError> {
    let model = ctx.model.as_ref();
    let classifier = ctx.classifier.as_ref();

    let outcome = match ctx.open_db() {
        Ok(conn) => {
            let store = SqliteStore::new(&conn);
            TurnOrchestrator::new(classifier, model, &store)
                .with_content_limit(ctx.content_limit)
                .with_ticket_policy(ctx.ticket_policy)
                .handle_turn(turn)?
        }
        Err(e) => {
            tracing::warn!(error = %e, "Database unavailable; answering without persistence");
            let store = UnavailableStore::new(e.to_string());
            TurnOrchestrator::new(classifier, model, &store)
                .with_content_limit(ctx.content_limit)
                .with_ticket_policy(ctx.ticket_policy)
                .handle_turn(turn)?
        }
    };
    Ok(outcome)
}

fn to_response(outcome: TurnOutcome) -> ChatResponse {
    ChatResponse {
        message: outcome.assistant_message,
        conversation_id: outcome.conversation_id,
        triage_level: outcome.triage.level,
        triage_reason: outcome.triage.reason,
        risk_score: outcome.triage.risk_score,
        emotion: outcome.emotion,
        intent: outcome.intent,
        recommended_content: outcome
            .recommended_content
            .into_iter()
            .map(ContentCard::from)
            .collect(),
        ticket_id: outcome.ticket.map(|t| t.id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: MessageRole, content: &str) -> ChatMessageIn {
        ChatMessageIn {
            role,
            content: content.into(),
        }
    }

    #[test]
    fn splits_at_last_user_message() {
        let (prior, message) = split_last_user(vec![
            msg(MessageRole::User, "first"),
            msg(MessageRole::Assistant, "reply"),
            msg(MessageRole::User, "second"),
            msg(MessageRole::Assistant, "stale"),
        ])
        .unwrap();
        assert_eq!(message, "second");
        assert_eq!(prior, vec![ChatTurn::user("first"), ChatTurn::assistant("reply")]);
    }

    #[test]
    fn history_without_user_message_is_rejected() {
        assert!(matches!(
            split_last_user(vec![msg(MessageRole::Assistant, "hello")]),
            Err(ApiError::BadRequest(_))
        ));
        assert!(split_last_user(vec![]).is_err());
    }

    #[test]
    fn session_id_is_hashed_before_use() {
        let turn = to_turn_request(ChatRequest {
            conversation_id: None,
            session_id: "client-session".into(),
            messages: vec![msg(MessageRole::User, "hi")],
        })
        .unwrap();
        assert_eq!(turn.session_hash, session_hash("client-session"));
        assert_ne!(turn.session_hash, "client-session");
    }
}
