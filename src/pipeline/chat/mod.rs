pub mod types;
pub mod model;
pub mod ollama;
pub mod gateway;
pub mod prompt;
pub mod recommend;
pub mod conversation;
pub mod orchestrator;

pub use model::ChatModel;
pub use orchestrator::TurnOrchestrator;
pub use types::{TurnOutcome, TurnRequest};

use thiserror::Error;

use crate::db::DatabaseError;

/// Failures of the external language-model call.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Language model unreachable at {0}")]
    Connection(String),

    #[error("Language model request timed out after {0}s")]
    Timeout(u64),

    #[error("Language model returned error (status {status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    #[error("Model returned an empty reply")]
    EmptyReply,
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] ModelError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] DatabaseError),
}
