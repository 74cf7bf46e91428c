use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{Emotion, Intent, MessageRole, RiskLevel};

/// Escalation record placed in the clinician review queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageTicket {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub session_hash: String,
    pub risk_level: RiskLevel,
    pub risk_score: f32,
    pub red_flags: Vec<String>,
    pub anonymized_transcript: Vec<TranscriptEntry>,
    pub clinician_notes: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Message snapshot held by a ticket. Carries no message or conversation ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub role: MessageRole,
    pub content: String,
    pub emotion: Option<Emotion>,
    pub intent: Option<Intent>,
    pub risk_score: Option<f32>,
    pub created_at: NaiveDateTime,
}

/// Partial update applied by `TicketStore::update_open_ticket`. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct TicketPatch {
    pub resolved: Option<bool>,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub clinician_notes: Option<String>,
}

/// Queue filter for the clinician view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatusFilter {
    Open,
    Resolved,
    #[default]
    All,
}
