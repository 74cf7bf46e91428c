pub mod types;
pub mod classify;
pub mod anonymize;
pub mod escalation;

pub use anonymize::{anonymize_transcript, redact_contact_details, session_hash};
pub use classify::{derive_topic, KeywordClassifier};
pub use escalation::{TicketManager, TicketPolicy};
pub use types::*;

use thiserror::Error;
use uuid::Uuid;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Ticket not found: {0}")]
    NotFound(Uuid),

    #[error("Ticket already resolved: {0}")]
    AlreadyResolved(Uuid),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DatabaseError),
}
