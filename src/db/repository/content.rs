use rusqlite::{params, Connection};

use super::{from_json, parse_uuid, to_json};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_content_entry(conn: &Connection, entry: &ContentEntry) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO content_entries
         (id, topic, title, short_summary, body, tags, clinician_reviewed, clinician_signed_by, active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            entry.id.to_string(),
            entry.topic,
            entry.title,
            entry.short_summary,
            entry.body,
            to_json("tags", &entry.tags)?,
            entry.clinician_reviewed as i32,
            entry.clinician_signed_by,
            entry.active as i32,
        ],
    )?;
    Ok(())
}

pub fn count_content_entries(conn: &Connection) -> Result<u32, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM content_entries", [], |row| {
        row.get::<_, u32>(0)
    })?;
    Ok(count)
}

/// Active entries whose topic is either `topic` or `fallback_topic`, at most `limit`.
///
/// Entries for the requested topic come before fallback entries; within a
/// topic the catalogue's insertion order is kept.
pub fn find_active_content_by_topic(
    conn: &Connection,
    topic: &str,
    fallback_topic: &str,
    limit: usize,
) -> Result<Vec<ContentEntry>, DatabaseError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut stmt = conn.prepare(
        "SELECT id, topic, title, short_summary, body, tags, clinician_reviewed, clinician_signed_by, active
         FROM content_entries
         WHERE active = 1 AND (topic = ?1 OR topic = ?2)
         ORDER BY CASE WHEN topic = ?1 THEN 0 ELSE 1 END, rowid ASC
         LIMIT ?3",
    )?;

    let rows = stmt.query_map(params![topic, fallback_topic, limit as i64], |row| {
        Ok(ContentRow {
            id: row.get(0)?,
            topic: row.get(1)?,
            title: row.get(2)?,
            short_summary: row.get(3)?,
            body: row.get(4)?,
            tags: row.get(5)?,
            clinician_reviewed: row.get(6)?,
            clinician_signed_by: row.get(7)?,
            active: row.get(8)?,
        })
    })?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(content_from_row(row?)?);
    }
    Ok(entries)
}

struct ContentRow {
    id: String,
    topic: String,
    title: String,
    short_summary: String,
    body: String,
    tags: String,
    clinician_reviewed: i32,
    clinician_signed_by: Option<String>,
    active: i32,
}

fn content_from_row(row: ContentRow) -> Result<ContentEntry, DatabaseError> {
    Ok(ContentEntry {
        id: parse_uuid(&row.id)?,
        topic: row.topic,
        title: row.title,
        short_summary: row.short_summary,
        body: row.body,
        tags: from_json("tags", &row.tags)?,
        clinician_reviewed: row.clinician_reviewed != 0,
        clinician_signed_by: row.clinician_signed_by,
        active: row.active != 0,
    })
}
