//! Clinician escalation: ticket creation and the resolution workflow.
//!
//! Lifecycle is strictly `open -> resolved`. Tickets are never reopened,
//! auto-resolved or deleted.

use std::str::FromStr;

use chrono::Local;
use uuid::Uuid;

use super::types::TriageAssessment;
use super::TriageError;
use crate::config::ConfigError;
use crate::db::TicketStore;
use crate::models::{TicketPatch, TicketStatusFilter, TranscriptEntry, TriageTicket};

/// How repeated escalations within one conversation are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TicketPolicy {
    /// Every high/urgent turn opens its own ticket.
    #[default]
    PerTurn,
    /// Reuse the conversation's open ticket instead of opening another.
    OneOpenPerConversation,
}

impl FromStr for TicketPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "per_turn" => Ok(Self::PerTurn),
            "one_open_per_conversation" => Ok(Self::OneOpenPerConversation),
            other => Err(ConfigError::InvalidValue {
                key: "POLYHEAL_TICKET_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

pub struct TicketManager<'a, T: TicketStore + ?Sized> {
    store: &'a T,
    policy: TicketPolicy,
}

impl<'a, T: TicketStore + ?Sized> TicketManager<'a, T> {
    pub fn new(store: &'a T) -> Self {
        Self {
            store,
            policy: TicketPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: TicketPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Open a ticket when the turn was assessed high or urgent.
    ///
    /// Returns `None` for low/moderate turns. Under
    /// `OneOpenPerConversation` an existing open ticket is returned as-is.
    pub fn maybe_escalate(
        &self,
        conversation_id: Uuid,
        session_hash: &str,
        assessment: &TriageAssessment,
        transcript: Vec<TranscriptEntry>,
    ) -> Result<Option<TriageTicket>, TriageError> {
        if !assessment.level.requires_escalation() {
            return Ok(None);
        }

        if self.policy == TicketPolicy::OneOpenPerConversation {
            if let Some(existing) = self.store.find_open_ticket(&conversation_id)? {
                tracing::info!(
                    ticket_id = %existing.id,
                    %conversation_id,
                    level = %assessment.level,
                    "Escalation coalesced into open ticket"
                );
                return Ok(Some(existing));
            }
        }

        let ticket = TriageTicket {
            id: Uuid::new_v4(),
            conversation_id,
            session_hash: session_hash.to_string(),
            risk_level: assessment.level,
            risk_score: assessment.risk_score,
            red_flags: assessment.red_flags.clone(),
            anonymized_transcript: transcript,
            clinician_notes: None,
            resolved: false,
            resolved_at: None,
            resolved_by: None,
            created_at: Local::now().naive_local(),
        };
        let ticket = self.store.create_ticket(ticket)?;

        tracing::warn!(
            ticket_id = %ticket.id,
            %conversation_id,
            level = %ticket.risk_level,
            red_flags = ticket.red_flags.len(),
            "Triage ticket opened"
        );
        Ok(Some(ticket))
    }

    /// Resolve an open ticket. Notes are stored verbatim, empty allowed.
    pub fn resolve(&self, ticket_id: Uuid, notes: &str) -> Result<TriageTicket, TriageError> {
        self.resolve_by(ticket_id, notes, None)
    }

    /// Resolve as `resolved_by`. The write only lands on an open ticket, so
    /// of two concurrent resolutions exactly one succeeds.
    pub fn resolve_by(
        &self,
        ticket_id: Uuid,
        notes: &str,
        resolved_by: Option<&str>,
    ) -> Result<TriageTicket, TriageError> {
        let patch = TicketPatch {
            resolved: Some(true),
            resolved_at: Some(Local::now().naive_local()),
            resolved_by: resolved_by.map(str::to_string),
            clinician_notes: Some(notes.to_string()),
        };
        let Some(updated) = self.store.update_open_ticket(&ticket_id, &patch)? else {
            // Nothing changed: either the id is unknown or someone resolved it first
            self.get(ticket_id)?;
            return Err(TriageError::AlreadyResolved(ticket_id));
        };

        tracing::info!(ticket_id = %ticket_id, "Triage ticket resolved");
        Ok(updated)
    }

    pub fn get(&self, ticket_id: Uuid) -> Result<TriageTicket, TriageError> {
        self.store
            .get_ticket(&ticket_id)?
            .ok_or(TriageError::NotFound(ticket_id))
    }

    /// Clinician queue, newest first.
    pub fn list(&self, filter: TicketStatusFilter) -> Result<Vec<TriageTicket>, TriageError> {
        Ok(self.store.list_tickets(filter)?)
    }

    pub fn count_open(&self) -> Result<usize, TriageError> {
        Ok(self.store.count_open_tickets()? as usize)
    }
}
