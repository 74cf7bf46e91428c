use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

pub fn insert_conversation(conn: &Connection, conv: &Conversation) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO conversations (id, session_hash, created_at) VALUES (?1, ?2, ?3)",
        params![
            conv.id.to_string(),
            conv.session_hash,
            format_timestamp(&conv.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_conversation(conn: &Connection, id: &Uuid) -> Result<Option<Conversation>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, session_hash, created_at FROM conversations WHERE id = ?1",
            params![id.to_string()],
            read_conversation_row,
        )
        .optional()?;

    row.map(conversation_from_row).transpose()
}

/// Most recent conversation started by a session, if any.
pub fn get_latest_conversation_for_session(
    conn: &Connection,
    session_hash: &str,
) -> Result<Option<Conversation>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, session_hash, created_at FROM conversations
             WHERE session_hash = ?1 ORDER BY created_at DESC, rowid DESC LIMIT 1",
            params![session_hash],
            read_conversation_row,
        )
        .optional()?;

    row.map(conversation_from_row).transpose()
}

pub fn insert_message(conn: &Connection, msg: &Message) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO messages (id, conversation_id, role, content, emotion, intent, risk_score, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            msg.id.to_string(),
            msg.conversation_id.to_string(),
            msg.role.as_str(),
            msg.content,
            msg.emotion.map(|e| e.as_str()),
            msg.intent.map(|i| i.as_str()),
            msg.risk_score,
            format_timestamp(&msg.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_messages_by_conversation(
    conn: &Connection,
    conversation_id: &Uuid,
) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, conversation_id, role, content, emotion, intent, risk_score, created_at
         FROM messages WHERE conversation_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;

    let rows = stmt.query_map(params![conversation_id.to_string()], |row| {
        Ok(MessageRow {
            id: row.get(0)?,
            conversation_id: row.get(1)?,
            role: row.get(2)?,
            content: row.get(3)?,
            emotion: row.get(4)?,
            intent: row.get(5)?,
            risk_score: row.get(6)?,
            created_at: row.get(7)?,
        })
    })?;

    let mut messages = Vec::new();
    for row in rows {
        messages.push(message_from_row(row?)?);
    }
    Ok(messages)
}

struct ConversationRow {
    id: String,
    session_hash: String,
    created_at: String,
}

struct MessageRow {
    id: String,
    conversation_id: String,
    role: String,
    content: String,
    emotion: Option<String>,
    intent: Option<String>,
    risk_score: Option<f32>,
    created_at: String,
}

fn read_conversation_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConversationRow> {
    Ok(ConversationRow {
        id: row.get(0)?,
        session_hash: row.get(1)?,
        created_at: row.get(2)?,
    })
}

fn conversation_from_row(row: ConversationRow) -> Result<Conversation, DatabaseError> {
    Ok(Conversation {
        id: parse_uuid(&row.id)?,
        session_hash: row.session_hash,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

fn message_from_row(row: MessageRow) -> Result<Message, DatabaseError> {
    Ok(Message {
        id: parse_uuid(&row.id)?,
        conversation_id: parse_uuid(&row.conversation_id)?,
        role: MessageRole::from_str(&row.role)?,
        content: row.content,
        emotion: row.emotion.as_deref().map(Emotion::from_str).transpose()?,
        intent: row.intent.as_deref().map(Intent::from_str).transpose()?,
        risk_score: row.risk_score,
        created_at: parse_timestamp(&row.created_at)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use chrono::Local;

    fn conversation(session_hash: &str) -> Conversation {
        Conversation {
            id: Uuid::new_v4(),
            session_hash: session_hash.to_string(),
            created_at: Local::now().naive_local(),
        }
    }

    fn message(conversation_id: Uuid, role: MessageRole, content: &str) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            emotion: None,
            intent: None,
            risk_score: None,
            created_at: Local::now().naive_local(),
        }
    }

    #[test]
    fn conversation_round_trips() {
        let conn = open_memory_database().unwrap();
        let conv = conversation("abc123");
        insert_conversation(&conn, &conv).unwrap();

        let loaded = get_conversation(&conn, &conv.id).unwrap().unwrap();
        assert_eq!(loaded.session_hash, "abc123");
        assert_eq!(loaded.created_at, conv.created_at);
    }

    #[test]
    fn unknown_conversation_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(get_conversation(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn latest_conversation_for_session() {
        let conn = open_memory_database().unwrap();
        let first = conversation("s1");
        let second = conversation("s1");
        insert_conversation(&conn, &first).unwrap();
        insert_conversation(&conn, &second).unwrap();
        insert_conversation(&conn, &conversation("s2")).unwrap();

        let latest = get_latest_conversation_for_session(&conn, "s1").unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert!(get_latest_conversation_for_session(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn messages_keep_insertion_order_and_tags() {
        let conn = open_memory_database().unwrap();
        let conv = conversation("s1");
        insert_conversation(&conn, &conv).unwrap();

        let user = message(conv.id, MessageRole::User, "I feel anxious");
        let mut reply = message(conv.id, MessageRole::Assistant, "We can handle this");
        reply.emotion = Some(Emotion::Anxious);
        reply.intent = Some(Intent::Reassurance);
        reply.risk_score = Some(0.2);
        // Same timestamp: rowid keeps the order
        reply.created_at = user.created_at;

        insert_message(&conn, &user).unwrap();
        insert_message(&conn, &reply).unwrap();

        let history = get_messages_by_conversation(&conn, &conv.id).unwrap();
        assert_eq!(history, vec![user, reply]);
    }

    #[test]
    fn message_requires_existing_conversation() {
        let conn = open_memory_database().unwrap();
        let orphan = message(Uuid::new_v4(), MessageRole::User, "Hello");
        assert!(insert_message(&conn, &orphan).is_err());
    }
}
