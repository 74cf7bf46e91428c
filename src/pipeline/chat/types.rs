use serde::Serialize;
use uuid::Uuid;

use crate::models::enums::{Emotion, Intent};
use crate::models::{ChatTurn, ContentEntry, TriageTicket};
use crate::pipeline::triage::TriageAssessment;

/// One inbound turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Conversation to append to. When absent, the session's latest
    /// conversation is reused or a new one is started.
    pub conversation_id: Option<Uuid>,
    /// Hashed client session id (see `triage::session_hash`).
    pub session_hash: String,
    /// Earlier turns as the client holds them, oldest first.
    pub prior_messages: Vec<ChatTurn>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// `None` when no conversation could be resolved or created.
    pub conversation_id: Option<Uuid>,
    pub assistant_message: String,
    pub triage: TriageAssessment,
    pub emotion: Emotion,
    pub intent: Intent,
    pub recommended_content: Vec<ContentEntry>,
    pub ticket: Option<TriageTicket>,
}
