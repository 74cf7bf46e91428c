use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, from_json, parse_timestamp, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const TICKET_COLUMNS: &str = "id, conversation_id, session_hash, risk_level, risk_score, red_flags,
     anonymized_transcript, clinician_notes, resolved, resolved_at, resolved_by, created_at";

pub fn insert_ticket(conn: &Connection, ticket: &TriageTicket) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO triage_tickets
         (id, conversation_id, session_hash, risk_level, risk_score, red_flags,
          anonymized_transcript, clinician_notes, resolved, resolved_at, resolved_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            ticket.id.to_string(),
            ticket.conversation_id.to_string(),
            ticket.session_hash,
            ticket.risk_level.as_str(),
            ticket.risk_score,
            to_json("red_flags", &ticket.red_flags)?,
            to_json("anonymized_transcript", &ticket.anonymized_transcript)?,
            ticket.clinician_notes,
            ticket.resolved as i32,
            ticket.resolved_at.as_ref().map(format_timestamp),
            ticket.resolved_by,
            format_timestamp(&ticket.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_ticket(conn: &Connection, id: &Uuid) -> Result<Option<TriageTicket>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM triage_tickets WHERE id = ?1"),
            params![id.to_string()],
            read_ticket_row,
        )
        .optional()?;

    row.map(ticket_from_row).transpose()
}

/// Apply a partial update to an unresolved ticket.
///
/// Returns `None` when the id is unknown or the ticket is already resolved;
/// the guard lives in the `WHERE` clause so concurrent writers cannot both win.
pub fn update_open_ticket(
    conn: &Connection,
    id: &Uuid,
    patch: &TicketPatch,
) -> Result<Option<TriageTicket>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE triage_tickets SET
            resolved = COALESCE(?2, resolved),
            resolved_at = COALESCE(?3, resolved_at),
            resolved_by = COALESCE(?4, resolved_by),
            clinician_notes = COALESCE(?5, clinician_notes)
         WHERE id = ?1 AND resolved = 0",
        params![
            id.to_string(),
            patch.resolved.map(|r| r as i32),
            patch.resolved_at.as_ref().map(format_timestamp),
            patch.resolved_by,
            patch.clinician_notes,
        ],
    )?;

    if changed == 0 {
        return Ok(None);
    }
    get_ticket(conn, id)
}

/// Clinician queue, newest first.
pub fn list_tickets(
    conn: &Connection,
    filter: TicketStatusFilter,
) -> Result<Vec<TriageTicket>, DatabaseError> {
    let condition = match filter {
        TicketStatusFilter::Open => "WHERE resolved = 0",
        TicketStatusFilter::Resolved => "WHERE resolved = 1",
        TicketStatusFilter::All => "",
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {TICKET_COLUMNS} FROM triage_tickets {condition} ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map([], read_ticket_row)?;
    let mut tickets = Vec::new();
    for row in rows {
        tickets.push(ticket_from_row(row?)?);
    }
    Ok(tickets)
}

pub fn count_open_tickets(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM triage_tickets WHERE resolved = 0",
        [],
        |row| row.get::<_, u32>(0),
    )?;
    Ok(count)
}

/// Oldest unresolved ticket of a conversation, if any.
pub fn find_open_ticket_for_conversation(
    conn: &Connection,
    conversation_id: &Uuid,
) -> Result<Option<TriageTicket>, DatabaseError> {
    let row = conn
        .query_row(
            &format!(
                "SELECT {TICKET_COLUMNS} FROM triage_tickets
                 WHERE conversation_id = ?1 AND resolved = 0
                 ORDER BY created_at ASC, rowid ASC LIMIT 1"
            ),
            params![conversation_id.to_string()],
            read_ticket_row,
        )
        .optional()?;

    row.map(ticket_from_row).transpose()
}

struct TicketRow {
    id: String,
    conversation_id: String,
    session_hash: String,
    risk_level: String,
    risk_score: f32,
    red_flags: String,
    anonymized_transcript: String,
    clinician_notes: Option<String>,
    resolved: i32,
    resolved_at: Option<String>,
    resolved_by: Option<String>,
    created_at: String,
}

fn read_ticket_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TicketRow> {
    Ok(TicketRow {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        session_hash: row.get(2)?,
        risk_level: row.get(3)?,
        risk_score: row.get(4)?,
        red_flags: row.get(5)?,
        anonymized_transcript: row.get(6)?,
        clinician_notes: row.get(7)?,
        resolved: row.get(8)?,
        resolved_at: row.get(9)?,
        resolved_by: row.get(10)?,
        created_at: row.get(11)?,
    })
}

fn ticket_from_row(row: TicketRow) -> Result<TriageTicket, DatabaseError> {
    Ok(TriageTicket {
        id: parse_uuid(&row.id)?,
        conversation_id: parse_uuid(&row.conversation_id)?,
        session_hash: row.session_hash,
        risk_level: RiskLevel::from_str(&row.risk_level)?,
        risk_score: row.risk_score,
        red_flags: from_json("red_flags", &row.red_flags)?,
        anonymized_transcript: from_json("anonymized_transcript", &row.anonymized_transcript)?,
        clinician_notes: row.clinician_notes,
        resolved: row.resolved != 0,
        resolved_at: row.resolved_at.as_deref().map(parse_timestamp).transpose()?,
        resolved_by: row.resolved_by,
        created_at: parse_timestamp(&row.created_at)?,
    })
}
