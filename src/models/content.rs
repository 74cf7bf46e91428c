use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback topic every recommendation query also matches.
pub const GENERAL_HEALTH_TOPIC: &str = "general_health";

/// Clinician-reviewed educational entry. Owned by the content catalogue;
/// the pipeline only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub id: Uuid,
    pub topic: String,
    pub title: String,
    pub short_summary: String,
    pub body: String,
    pub tags: Vec<String>,
    pub clinician_reviewed: bool,
    pub clinician_signed_by: Option<String>,
    pub active: bool,
}
