//! HTTP surface of the triage service.
//!
//! Chat turns for the browser client plus the clinician queue. Blocking work
//! (SQLite, the language-model call) runs on `spawn_blocking` threads.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_api_server, ApiServer};
pub use types::ApiContext;
