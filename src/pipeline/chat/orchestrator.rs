use chrono::{Duration, Local};

use super::conversation::ConversationLog;
use super::model::ChatModel;
use super::prompt::compose;
use super::recommend::ContentRecommender;
use super::types::{TurnOutcome, TurnRequest};
use super::ChatError;
use crate::config::DEFAULT_CONTENT_LIMIT;
use crate::db::{ContentStore, MessageStore, TicketStore};
use crate::models::{ChatTurn, Conversation, TranscriptEntry, TriageTicket};
use crate::pipeline::triage::{
    redact_contact_details, Classification, KeywordClassifier, TicketManager, TicketPolicy,
};

pub const MAX_MESSAGE_CHARS: usize = 4_000;

/// Runs one conversational turn end to end.
///
/// validate → resolve conversation → persist user message → classify →
/// recommend → compose → model → persist reply → escalate.
///
/// Only input validation and the model call can fail the turn. Every
/// storage step is best-effort and logged.
pub struct TurnOrchestrator<'a, M, S>
where
    M: ChatModel + ?Sized,
    S: ContentStore + MessageStore + TicketStore + ?Sized,
{
    classifier: &'a KeywordClassifier,
    model: &'a M,
    store: &'a S,
    content_limit: usize,
    ticket_policy: TicketPolicy,
}

impl<'a, M, S> TurnOrchestrator<'a, M, S>
where
    M: ChatModel + ?Sized,
    S: ContentStore + MessageStore + TicketStore + ?Sized,
{
    pub fn new(classifier: &'a KeywordClassifier, model: &'a M, store: &'a S) -> Self {
        Self {
            classifier,
            model,
            store,
            content_limit: DEFAULT_CONTENT_LIMIT,
            ticket_policy: TicketPolicy::default(),
        }
    }

    pub fn with_content_limit(mut self, limit: usize) -> Self {
        self.content_limit = limit;
        self
    }

    pub fn with_ticket_policy(mut self, policy: TicketPolicy) -> Self {
        self.ticket_policy = policy;
        self
    }

    pub fn handle_turn(&self, request: TurnRequest) -> Result<TurnOutcome, ChatError> {
        let message = validate(&request)?;
        let log = ConversationLog::new(self.store);

        let conversation = match log.resolve(request.conversation_id, &request.session_hash) {
            Ok(conversation) => Some(conversation),
            Err(e) => {
                tracing::warn!(error = %e, "Conversation unavailable; turn will not be persisted");
                None
            }
        };

        if let Some(conv) = &conversation {
            if let Err(e) = log.append_user(conv.id, message) {
                tracing::warn!(conversation_id = %conv.id, error = %e, "Failed to persist user message");
            }
        }

        let classification = self.classifier.classify(message);
        let recommended = ContentRecommender::new(self.store, self.classifier.tables())
            .recommend(message, self.content_limit);
        tracing::info!(
            level = %classification.risk.level,
            emotion = %classification.emotion,
            intent = %classification.intent,
            content = recommended.len(),
            "Turn classified"
        );

        let instruction = compose(
            &classification.risk,
            classification.emotion,
            classification.intent,
            &recommended,
        );
        let mut history = request.prior_messages.clone();
        history.push(ChatTurn::user(message));

        let reply = self.model.complete(&instruction, &history).map_err(|e| {
            tracing::error!(error = %e, "Language model call failed");
            ChatError::UpstreamUnavailable(e)
        })?;

        let ticket = match &conversation {
            Some(conv) => self.record_reply(&log, conv, &reply, &classification, &history),
            None => {
                if classification.risk.level.requires_escalation() {
                    tracing::error!(
                        level = %classification.risk.level,
                        "Escalation could not be recorded: no conversation"
                    );
                }
                None
            }
        };

        Ok(TurnOutcome {
            conversation_id: conversation.map(|c| c.id),
            assistant_message: reply,
            triage: classification.risk,
            emotion: classification.emotion,
            intent: classification.intent,
            recommended_content: recommended,
            ticket,
        })
    }

    /// Persist the reply and open a ticket if needed. Failures are logged only:
    /// the user already has their answer.
    fn record_reply(
        &self,
        log: &ConversationLog<'_, S>,
        conversation: &Conversation,
        reply: &str,
        classification: &Classification,
        history: &[ChatTurn],
    ) -> Option<TriageTicket> {
        if let Err(e) = log.append_assistant(conversation.id, reply, classification) {
            tracing::warn!(conversation_id = %conversation.id, error = %e, "Failed to persist assistant message");
        }

        if !classification.risk.level.requires_escalation() {
            return None;
        }

        let transcript = log.transcript(conversation.id).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Transcript unavailable; snapshotting client history");
            transcript_from_turns(history, reply)
        });

        let manager = TicketManager::new(self.store).with_policy(self.ticket_policy);
        match manager.maybe_escalate(
            conversation.id,
            &conversation.session_hash,
            &classification.risk,
            transcript,
        ) {
            Ok(ticket) => ticket,
            Err(e) => {
                tracing::error!(conversation_id = %conversation.id, error = %e, "Failed to open triage ticket");
                None
            }
        }
    }
}

fn validate(request: &TurnRequest) -> Result<&str, ChatError> {
    let message = request.message.trim();
    if message.is_empty() {
        return Err(ChatError::InvalidInput("message is empty".into()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ChatError::InvalidInput(format!(
            "message exceeds {MAX_MESSAGE_CHARS} characters"
        )));
    }
    if request.session_hash.trim().is_empty() {
        return Err(ChatError::InvalidInput("session is required".into()));
    }
    Ok(message)
}

/// Rebuild a transcript from the request when the stored log is unreadable.
/// Arrival times are unknown, so entries are spaced one millisecond apart
/// ending at the reply; only their order carries meaning.
fn transcript_from_turns(history: &[ChatTurn], reply: &str) -> Vec<TranscriptEntry> {
    let start = Local::now().naive_local() - Duration::milliseconds(history.len() as i64);
    history
        .iter()
        .cloned()
        .chain(std::iter::once(ChatTurn::assistant(reply)))
        .enumerate()
        .map(|(i, turn)| TranscriptEntry {
            role: turn.role,
            content: redact_contact_details(&turn.content),
            emotion: None,
            intent: None,
            risk_score: None,
            created_at: start + Duration::milliseconds(i as i64),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::insert_content_entry;
    use crate::db::sqlite::open_memory_database;
    use crate::db::{SqliteStore, UnavailableStore};
    use crate::models::enums::{Emotion, Intent, MessageRole, RiskLevel};
    use crate::models::*;
    use crate::pipeline::chat::model::StubChatModel;
    use crate::pipeline::chat::prompt::DISCLAIMER;
    use rusqlite::Connection;
    use uuid::Uuid;

    fn request(message: &str) -> TurnRequest {
        TurnRequest {
            conversation_id: None,
            session_hash: "session-hash".into(),
            prior_messages: vec![],
            message: message.into(),
        }
    }

    fn seeded_db() -> Connection {
        let conn = open_memory_database().unwrap();
        for (topic, title) in [
            ("intimate_infections", "Understanding Thrush"),
            ("intimate_infections", "BV or Yeast?"),
            ("intimate_infections", "Intimate Hygiene Myths"),
            ("intimate_infections", "When Thrush Keeps Coming Back"),
            (GENERAL_HEALTH_TOPIC, "When to See a Doctor"),
        ] {
            insert_content_entry(
                &conn,
                &ContentEntry {
                    id: Uuid::new_v4(),
                    topic: topic.into(),
                    title: title.into(),
                    short_summary: format!("Summary of {title}"),
                    body: String::new(),
                    tags: vec![],
                    clinician_reviewed: true,
                    clinician_signed_by: None,
                    active: true,
                },
            )
            .unwrap();
        }
        conn
    }

    #[test]
    fn low_risk_question_end_to_end() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("Thrush is a common yeast overgrowth.");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        let outcome = orchestrator.handle_turn(request("What is a yeast infection?")).unwrap();
        assert_eq!(outcome.triage.level, RiskLevel::Low);
        assert_eq!(outcome.intent, Intent::InfoRequest);
        assert_eq!(outcome.emotion, Emotion::Neutral);
        assert!(outcome.ticket.is_none());
        assert_eq!(outcome.recommended_content.len(), 3);
        assert!(outcome
            .recommended_content
            .iter()
            .all(|e| e.topic == "intimate_infections"));
        assert_eq!(outcome.assistant_message, "Thrush is a common yeast overgrowth.");

        let (instruction, history) = model.last_call().unwrap();
        assert!(instruction.contains(DISCLAIMER));
        assert!(instruction.contains("Understanding Thrush"));
        assert_eq!(history, vec![ChatTurn::user("What is a yeast infection?")]);

        let conv_id = outcome.conversation_id.unwrap();
        let stored = store.list_messages(&conv_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].role, MessageRole::User);
        assert_eq!(stored[1].role, MessageRole::Assistant);
        assert_eq!(stored[1].intent, Some(Intent::InfoRequest));
        assert_eq!(stored[1].risk_score, Some(0.2));
    }

    #[test]
    fn urgent_turn_opens_ticket_with_transcript() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("Please call emergency services now.");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        let outcome = orchestrator
            .handle_turn(request("I've been having severe pain and I can't breathe"))
            .unwrap();
        assert_eq!(outcome.triage.level, RiskLevel::Urgent);
        assert_eq!(outcome.triage.risk_score, 0.95);

        let ticket = outcome.ticket.unwrap();
        assert_eq!(Some(ticket.conversation_id), outcome.conversation_id);
        assert_eq!(ticket.session_hash, "session-hash");
        assert!(ticket.red_flags.contains(&"severe pain".to_string()));
        assert!(ticket.red_flags.contains(&"can't breathe".to_string()));
        assert_eq!(ticket.anonymized_transcript.len(), 2);
        assert_eq!(ticket.anonymized_transcript[1].content, "Please call emergency services now.");
        assert_eq!(store.list_tickets(TicketStatusFilter::Open).unwrap().len(), 1);
    }

    #[test]
    fn ticket_transcript_is_a_snapshot() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("ok");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        let first = orchestrator.handle_turn(request("chest pain right now")).unwrap();
        let ticket = first.ticket.unwrap();
        orchestrator.handle_turn(request("thanks, feeling calmer")).unwrap();

        let reloaded = store.get_ticket(&ticket.id).unwrap().unwrap();
        assert_eq!(reloaded.anonymized_transcript.len(), 2);
    }

    #[test]
    fn repeated_urgent_turns_follow_ticket_policy() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("ok");

        let per_turn = TurnOrchestrator::new(&classifier, &model, &store);
        per_turn.handle_turn(request("chest pain")).unwrap();
        per_turn.handle_turn(request("still chest pain")).unwrap();
        assert_eq!(store.list_tickets(TicketStatusFilter::Open).unwrap().len(), 2);

        let mut other_session = request("overdose");
        other_session.session_hash = "other".into();
        let coalescing = TurnOrchestrator::new(&classifier, &model, &store)
            .with_ticket_policy(TicketPolicy::OneOpenPerConversation);
        let a = coalescing.handle_turn(other_session.clone()).unwrap();
        let b = coalescing.handle_turn(other_session).unwrap();
        assert_eq!(a.ticket.unwrap().id, b.ticket.unwrap().id);
        assert_eq!(store.list_tickets(TicketStatusFilter::Open).unwrap().len(), 3);
    }

    #[test]
    fn model_failure_keeps_only_the_user_message() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::failing();
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        let conv_id = Uuid::new_v4();
        let mut req = request("chest pain and I can't breathe");
        req.conversation_id = Some(conv_id);

        let err = orchestrator.handle_turn(req).unwrap_err();
        assert!(matches!(err, ChatError::UpstreamUnavailable(_)));

        let stored = store.list_messages(&conv_id).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, MessageRole::User);
        assert!(store.list_tickets(TicketStatusFilter::All).unwrap().is_empty());
    }

    #[test]
    fn invalid_input_never_reaches_the_model() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("unused");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        assert!(matches!(
            orchestrator.handle_turn(request("   ")),
            Err(ChatError::InvalidInput(_))
        ));
        assert!(matches!(
            orchestrator.handle_turn(request(&"a".repeat(MAX_MESSAGE_CHARS + 1))),
            Err(ChatError::InvalidInput(_))
        ));
        let mut no_session = request("hello");
        no_session.session_hash = String::new();
        assert!(matches!(
            orchestrator.handle_turn(no_session),
            Err(ChatError::InvalidInput(_))
        ));
        assert!(model.last_call().is_none());
    }

    #[test]
    fn prior_messages_are_forwarded_in_order() {
        let conn = seeded_db();
        let store = SqliteStore::new(&conn);
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("ok");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store).with_content_limit(1);

        let mut req = request("  is this normal?  ");
        req.prior_messages = vec![ChatTurn::user("my period is late"), ChatTurn::assistant("Let's think.")];
        let outcome = orchestrator.handle_turn(req).unwrap();
        assert!(outcome.recommended_content.len() <= 1);

        let (_, history) = model.last_call().unwrap();
        assert_eq!(
            history,
            vec![
                ChatTurn::user("my period is late"),
                ChatTurn::assistant("Let's think."),
                ChatTurn::user("is this normal?"),
            ]
        );
    }

    #[test]
    fn storage_outage_still_answers() {
        let classifier = KeywordClassifier::default();
        let model = StubChatModel::replying("We're here.");
        let store = UnavailableStore::new("offline");
        let orchestrator = TurnOrchestrator::new(&classifier, &model, &store);

        let outcome = orchestrator.handle_turn(request("chest pain")).unwrap();
        assert_eq!(outcome.assistant_message, "We're here.");
        assert_eq!(outcome.triage.level, RiskLevel::Urgent);
        assert!(outcome.conversation_id.is_none());
        assert!(outcome.recommended_content.is_empty());
        assert!(outcome.ticket.is_none());
    }

    #[test]
    fn fallback_transcript_redacts_and_appends_reply() {
        let history = vec![ChatTurn::user("call me 06 12 34 56 78")];
        let transcript = transcript_from_turns(&history, "Calling for help");
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].content, "call me [phone]");
        assert_eq!(transcript[1].role, MessageRole::Assistant);
    }

    #[test]
    fn fallback_transcript_times_keep_turn_order() {
        let history = vec![
            ChatTurn::user("first"),
            ChatTurn::assistant("second"),
            ChatTurn::user("third"),
        ];
        let transcript = transcript_from_turns(&history, "fourth");
        assert_eq!(transcript.len(), 4);
        assert!(transcript
            .windows(2)
            .all(|pair| pair[0].created_at < pair[1].created_at));
    }
}
