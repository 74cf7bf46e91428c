//! Storage seams used by the pipeline.
//!
//! The pipeline only talks to these traits; `SqliteStore` is the shipped
//! adapter over a borrowed `rusqlite::Connection`.

use rusqlite::Connection;
use uuid::Uuid;

use super::repository;
use super::DatabaseError;
use crate::models::*;

/// Read-only access to the educational content catalogue.
pub trait ContentStore {
    fn find_active_by_topic(
        &self,
        topic: &str,
        fallback_topic: &str,
        limit: usize,
    ) -> Result<Vec<ContentEntry>, DatabaseError>;
}

/// Append-only conversation log.
pub trait MessageStore {
    fn create_conversation(&self, conversation: &Conversation) -> Result<(), DatabaseError>;

    fn find_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, DatabaseError>;

    fn find_conversation_by_session(
        &self,
        session_hash: &str,
    ) -> Result<Option<Conversation>, DatabaseError>;

    fn append_message(&self, message: Message) -> Result<Message, DatabaseError>;

    fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, DatabaseError>;
}

/// Clinician triage queue.
pub trait TicketStore {
    fn create_ticket(&self, ticket: TriageTicket) -> Result<TriageTicket, DatabaseError>;

    fn get_ticket(&self, id: &Uuid) -> Result<Option<TriageTicket>, DatabaseError>;

    /// Patch a ticket only while it is unresolved; `None` otherwise.
    fn update_open_ticket(
        &self,
        id: &Uuid,
        patch: &TicketPatch,
    ) -> Result<Option<TriageTicket>, DatabaseError>;

    fn list_tickets(&self, filter: TicketStatusFilter) -> Result<Vec<TriageTicket>, DatabaseError>;

    fn count_open_tickets(&self) -> Result<u32, DatabaseError>;

    fn find_open_ticket(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<TriageTicket>, DatabaseError>;
}

/// SQLite-backed implementation of every store trait.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl ContentStore for SqliteStore<'_> {
    fn find_active_by_topic(
        &self,
        topic: &str,
        fallback_topic: &str,
        limit: usize,
    ) -> Result<Vec<ContentEntry>, DatabaseError> {
        repository::find_active_content_by_topic(self.conn, topic, fallback_topic, limit)
    }
}

impl MessageStore for SqliteStore<'_> {
    fn create_conversation(&self, conversation: &Conversation) -> Result<(), DatabaseError> {
        repository::insert_conversation(self.conn, conversation)
    }

    fn find_conversation(&self, id: &Uuid) -> Result<Option<Conversation>, DatabaseError> {
        repository::get_conversation(self.conn, id)
    }

    fn find_conversation_by_session(
        &self,
        session_hash: &str,
    ) -> Result<Option<Conversation>, DatabaseError> {
        repository::get_latest_conversation_for_session(self.conn, session_hash)
    }

    fn append_message(&self, message: Message) -> Result<Message, DatabaseError> {
        repository::insert_message(self.conn, &message)?;
        Ok(message)
    }

    fn list_messages(&self, conversation_id: &Uuid) -> Result<Vec<Message>, DatabaseError> {
        repository::get_messages_by_conversation(self.conn, conversation_id)
    }
}

impl TicketStore for SqliteStore<'_> {
    fn create_ticket(&self, ticket: TriageTicket) -> Result<TriageTicket, DatabaseError> {
        repository::insert_ticket(self.conn, &ticket)?;
        Ok(ticket)
    }

    fn get_ticket(&self, id: &Uuid) -> Result<Option<TriageTicket>, DatabaseError> {
        repository::get_ticket(self.conn, id)
    }

    fn update_open_ticket(
        &self,
        id: &Uuid,
        patch: &TicketPatch,
    ) -> Result<Option<TriageTicket>, DatabaseError> {
        repository::update_open_ticket(self.conn, id, patch)
    }

    fn list_tickets(&self, filter: TicketStatusFilter) -> Result<Vec<TriageTicket>, DatabaseError> {
        repository::list_tickets(self.conn, filter)
    }

    fn count_open_tickets(&self) -> Result<u32, DatabaseError> {
        repository::count_open_tickets(self.conn)
    }

    fn find_open_ticket(
        &self,
        conversation_id: &Uuid,
    ) -> Result<Option<TriageTicket>, DatabaseError> {
        repository::find_open_ticket_for_conversation(self.conn, conversation_id)
    }
}

/// Stand-in used when the database cannot be opened. Every call fails with
/// `DatabaseError::Unavailable`, so callers degrade the same way they do for
/// any other storage outage.
#[derive(Debug, Clone)]
pub struct UnavailableStore {
    reason: String,
}

impl UnavailableStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn fail<T>(&self) -> Result<T, DatabaseError> {
        Err(DatabaseError::Unavailable(self.reason.clone()))
    }
}

impl ContentStore for UnavailableStore {
    fn find_active_by_topic(&self, _: &str, _: &str, _: usize) -> Result<Vec<ContentEntry>, DatabaseError> {
        self.fail()
    }
}

impl MessageStore for UnavailableStore {
    fn create_conversation(&self, _: &Conversation) -> Result<(), DatabaseError> {
        self.fail()
    }

    fn find_conversation(&self, _: &Uuid) -> Result<Option<Conversation>, DatabaseError> {
        self.fail()
    }

    fn find_conversation_by_session(&self, _: &str) -> Result<Option<Conversation>, DatabaseError> {
        self.fail()
    }

    fn append_message(&self, _: Message) -> Result<Message, DatabaseError> {
        self.fail()
    }

    fn list_messages(&self, _: &Uuid) -> Result<Vec<Message>, DatabaseError> {
        self.fail()
    }
}

impl TicketStore for UnavailableStore {
    fn create_ticket(&self, _: TriageTicket) -> Result<TriageTicket, DatabaseError> {
        self.fail()
    }

    fn get_ticket(&self, _: &Uuid) -> Result<Option<TriageTicket>, DatabaseError> {
        self.fail()
    }

    fn update_open_ticket(&self, _: &Uuid, _: &TicketPatch) -> Result<Option<TriageTicket>, DatabaseError> {
        self.fail()
    }

    fn list_tickets(&self, _: TicketStatusFilter) -> Result<Vec<TriageTicket>, DatabaseError> {
        self.fail()
    }

    fn count_open_tickets(&self) -> Result<u32, DatabaseError> {
        self.fail()
    }

    fn find_open_ticket(&self, _: &Uuid) -> Result<Option<TriageTicket>, DatabaseError> {
        self.fail()
    }
}
