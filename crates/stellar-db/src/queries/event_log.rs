//! Audit event-log query operations.
//!
//! Entries are insert-only; nothing in this service updates or deletes them.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use stellar_common::EventId;
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::{EventLogEntry, NewEventLogEntry};
use crate::queries::{parse_timestamp, parse_uuid};

fn map_entry(row: &Row<'_>) -> rusqlite::Result<EventLogEntry> {
    let id = parse_uuid(0, &row.get::<_, String>(0)?)?;
    let payload: String = row.get(3)?;
    let payload = serde_json::from_str(&payload).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(EventLogEntry {
        id: EventId::from(id),
        event_type: row.get(1)?,
        user_id: row.get(2)?,
        payload,
        ip_address: row.get(4)?,
        user_agent: row.get(5)?,
        session_id: row.get(6)?,
        created_at: parse_timestamp(&row.get::<_, String>(7)?),
    })
}

/// Insert a new event-log entry.
pub fn insert_event(conn: &Connection, entry: &NewEventLogEntry) -> Result<EventLogEntry> {
    let id = EventId::from(Uuid::new_v4());
    let now = Utc::now();
    let payload = serde_json::to_string(&entry.payload)
        .map_err(|e| DbError::database(format!("Failed to serialize event payload: {}", e)))?;

    conn.execute(
        "INSERT INTO event_log (id, event_type, user_id, payload, ip_address, user_agent,
         session_id, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            id.to_string(),
            entry.event_type,
            entry.user_id,
            payload,
            entry.ip_address,
            entry.user_agent,
            entry.session_id,
            now.to_rfc3339(),
        ],
    )
    .map_err(|e| DbError::database(e.to_string()))?;

    Ok(EventLogEntry {
        id,
        event_type: entry.event_type.clone(),
        user_id: entry.user_id.clone(),
        payload: entry.payload.clone(),
        ip_address: entry.ip_address.clone(),
        user_agent: entry.user_agent.clone(),
        session_id: entry.session_id.clone(),
        created_at: now,
    })
}

/// List the most recent entries, newest first.
pub fn list_recent(conn: &Connection, limit: i64) -> Result<Vec<EventLogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, event_type, user_id, payload, ip_address, user_agent, session_id,
             created_at
             FROM event_log ORDER BY created_at DESC LIMIT ?",
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit], map_entry)
        .map_err(|e| DbError::database(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(|e| DbError::database(e.to_string()))?);
    }
    Ok(entries)
}

/// List entries with the given event type, newest first.
pub fn list_by_type(conn: &Connection, event_type: &str, limit: i64) -> Result<Vec<EventLogEntry>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, event_type, user_id, payload, ip_address, user_agent, session_id,
             created_at
             FROM event_log WHERE event_type = ? ORDER BY created_at DESC LIMIT ?",
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    let rows = stmt
        .query_map(params![event_type, limit], map_entry)
        .map_err(|e| DbError::database(e.to_string()))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(|e| DbError::database(e.to_string()))?);
    }
    Ok(entries)
}
