//! Shared state and wire types for the HTTP layer.
//!
//! Domain models serialize in snake_case; everything that crosses the HTTP
//! boundary is camelCase and lives here.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db::sqlite::open_database;
use crate::models::enums::{Emotion, Intent, MessageRole, RiskLevel};
use crate::models::{ContentEntry, Message, TranscriptEntry, TriageTicket};
use crate::pipeline::chat::ChatModel;
use crate::pipeline::triage::{KeywordClassifier, TicketPolicy};

// ═══════════════════════════════════════════════════════════
// API context
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes. Cheap to clone.
#[derive(Clone)]
pub struct ApiContext {
    pub db_path: Arc<PathBuf>,
    pub classifier: Arc<KeywordClassifier>,
    pub model: Arc<dyn ChatModel>,
    pub content_limit: usize,
    pub ticket_policy: TicketPolicy,
}

impl ApiContext {
    pub fn new(
        db_path: PathBuf,
        classifier: KeywordClassifier,
        model: Arc<dyn ChatModel>,
        content_limit: usize,
        ticket_policy: TicketPolicy,
    ) -> Self {
        Self {
            db_path: Arc::new(db_path),
            classifier: Arc::new(classifier),
            model,
            content_limit,
            ticket_policy,
        }
    }

    /// Open a connection for one request. Blocking: call from a blocking task.
    pub fn open_db(&self) -> Result<Connection, ApiError> {
        Ok(open_database(&self.db_path)?)
    }
}

// ═══════════════════════════════════════════════════════════
// Chat
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub conversation_id: Option<Uuid>,
    pub session_id: String,
    pub messages: Vec<ChatMessageIn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMessageIn {
    pub role: MessageRole,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub message: String,
    pub conversation_id: Option<Uuid>,
    pub triage_level: RiskLevel,
    pub triage_reason: String,
    pub risk_score: f32,
    pub emotion: Emotion,
    pub intent: Intent,
    pub recommended_content: Vec<ContentCard>,
    pub ticket_id: Option<Uuid>,
}

/// Catalogue entry as shown next to a reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentCard {
    pub id: Uuid,
    pub topic: String,
    pub title: String,
    pub short_summary: String,
    pub tags: Vec<String>,
    pub clinician_signed_by: Option<String>,
}

impl From<ContentEntry> for ContentCard {
    fn from(entry: ContentEntry) -> Self {
        Self {
            id: entry.id,
            topic: entry.topic,
            title: entry.title,
            short_summary: entry.short_summary,
            tags: entry.tags,
            clinician_signed_by: entry.clinician_signed_by,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tickets
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub session_hash: String,
    pub risk_level: RiskLevel,
    pub risk_score: f32,
    pub red_flags: Vec<String>,
    pub anonymized_transcript: Vec<TranscriptEntryView>,
    pub clinician_notes: Option<String>,
    pub resolved: bool,
    pub resolved_at: Option<NaiveDateTime>,
    pub resolved_by: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntryView {
    pub role: MessageRole,
    pub content: String,
    pub emotion: Option<Emotion>,
    pub intent: Option<Intent>,
    pub risk_score: Option<f32>,
    pub created_at: NaiveDateTime,
}

impl From<TranscriptEntry> for TranscriptEntryView {
    fn from(entry: TranscriptEntry) -> Self {
        Self {
            role: entry.role,
            content: entry.content,
            emotion: entry.emotion,
            intent: entry.intent,
            risk_score: entry.risk_score,
            created_at: entry.created_at,
        }
    }
}

impl From<TriageTicket> for TicketView {
    fn from(ticket: TriageTicket) -> Self {
        Self {
            id: ticket.id,
            conversation_id: ticket.conversation_id,
            session_hash: ticket.session_hash,
            risk_level: ticket.risk_level,
            risk_score: ticket.risk_score,
            red_flags: ticket.red_flags,
            anonymized_transcript: ticket
                .anonymized_transcript
                .into_iter()
                .map(TranscriptEntryView::from)
                .collect(),
            clinician_notes: ticket.clinician_notes,
            resolved: ticket.resolved,
            resolved_at: ticket.resolved_at,
            resolved_by: ticket.resolved_by,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketListResponse {
    pub tickets: Vec<TicketView>,
    pub open_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub resolved_by: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Conversations
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub emotion: Option<Emotion>,
    pub intent: Option<Intent>,
    pub risk_score: Option<f32>,
    pub created_at: NaiveDateTime,
}

impl From<Message> for MessageView {
    fn from(msg: Message) -> Self {
        Self {
            id: msg.id,
            role: msg.role,
            content: msg.content,
            emotion: msg.emotion,
            intent: msg.intent,
            risk_score: msg.risk_score,
            created_at: msg.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessagesResponse {
    pub conversation_id: Uuid,
    pub messages: Vec<MessageView>,
}
