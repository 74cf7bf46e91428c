use chrono::Local;
use uuid::Uuid;

use super::ChatError;
use crate::db::MessageStore;
use crate::models::enums::MessageRole;
use crate::models::{Conversation, Message, TranscriptEntry};
use crate::pipeline::triage::{anonymize_transcript, Classification};

/// Conversation lifecycle and message persistence on top of a `MessageStore`.
pub struct ConversationLog<'a, S: MessageStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: MessageStore + ?Sized> ConversationLog<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Find the conversation a turn belongs to, creating it if needed.
    ///
    /// A supplied id that the store does not know is created under that id,
    /// so client-held ids survive a store reset. An id owned by another
    /// session is never joined: the turn starts a fresh conversation instead.
    pub fn resolve(
        &self,
        conversation_id: Option<Uuid>,
        session_hash: &str,
    ) -> Result<Conversation, ChatError> {
        if let Some(id) = conversation_id {
            return match self.store.find_conversation(&id)? {
                Some(existing) if existing.session_hash == session_hash => Ok(existing),
                Some(_) => {
                    tracing::warn!(conversation_id = %id, "Conversation belongs to another session; starting a new one");
                    self.start(Uuid::new_v4(), session_hash)
                }
                None => self.start(id, session_hash),
            };
        }

        match self.store.find_conversation_by_session(session_hash)? {
            Some(existing) => Ok(existing),
            None => self.start(Uuid::new_v4(), session_hash),
        }
    }

    fn start(&self, id: Uuid, session_hash: &str) -> Result<Conversation, ChatError> {
        let conversation = Conversation {
            id,
            session_hash: session_hash.to_string(),
            created_at: Local::now().naive_local(),
        };
        self.store.create_conversation(&conversation)?;
        tracing::debug!(conversation_id = %id, "Conversation started");
        Ok(conversation)
    }

    pub fn append_user(&self, conversation_id: Uuid, text: &str) -> Result<Message, ChatError> {
        let msg = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: MessageRole::User,
            content: text.to_string(),
            emotion: None,
            intent: None,
            risk_score: None,
            created_at: Local::now().naive_local(),
        };
        Ok(self.store.append_message(msg)?)
    }

    /// Store the reply annotated with the classification of the user message it answers.
    pub fn append_assistant(
        &self,
        conversation_id: Uuid,
        text: &str,
        classification: &Classification,
    ) -> Result<Message, ChatError> {
        let msg = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role: MessageRole::Assistant,
            content: text.to_string(),
            emotion: Some(classification.emotion),
            intent: Some(classification.intent),
            risk_score: Some(classification.risk.risk_score),
            created_at: Local::now().naive_local(),
        };
        Ok(self.store.append_message(msg)?)
    }

    pub fn history(&self, conversation_id: Uuid) -> Result<Vec<Message>, ChatError> {
        Ok(self.store.list_messages(&conversation_id)?)
    }

    /// Anonymised snapshot of everything stored so far.
    pub fn transcript(&self, conversation_id: Uuid) -> Result<Vec<TranscriptEntry>, ChatError> {
        let messages = self.history(conversation_id)?;
        Ok(anonymize_transcript(&messages))
    }
}
