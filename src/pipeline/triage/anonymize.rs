//! Privacy helpers for escalation records.
//!
//! Tickets never carry the raw client session id or message/conversation ids;
//! they hold a SHA-256 digest of the session and a transcript copy with
//! contact details redacted.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};

use crate::models::{Message, TranscriptEntry};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("valid email regex")
});

// Seven or more digits, optionally grouped by spaces, dots, dashes or parentheses.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?\(?\d[\d\s().-]{5,}\d").expect("valid phone regex")
});

pub const EMAIL_PLACEHOLDER: &str = "[email]";
pub const PHONE_PLACEHOLDER: &str = "[phone]";

/// Stable, non-reversible identifier for a client session id.
pub fn session_hash(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.trim().as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Replace email addresses and phone numbers with placeholders.
pub fn redact_contact_details(text: &str) -> String {
    let without_emails = EMAIL_RE.replace_all(text, EMAIL_PLACEHOLDER);
    PHONE_RE
        .replace_all(&without_emails, |caps: &regex::Captures| {
            let digits = caps[0].chars().filter(char::is_ascii_digit).count();
            if digits >= 7 {
                PHONE_PLACEHOLDER.to_string()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Snapshot a conversation for a ticket: ids dropped, contact details redacted.
pub fn anonymize_transcript(messages: &[Message]) -> Vec<TranscriptEntry> {
    messages
        .iter()
        .map(|m| TranscriptEntry {
            role: m.role,
            content: redact_contact_details(&m.content),
            emotion: m.emotion,
            intent: m.intent,
            risk_score: m.risk_score,
            created_at: m.created_at,
        })
        .collect()
}
