//! Dead-letter query operations.

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

use crate::error::{DbError, Result};
use crate::models::DeadLetter;
use crate::queries::parse_timestamp;

fn map_dead_letter(row: &Row<'_>) -> rusqlite::Result<DeadLetter> {
    Ok(DeadLetter {
        id: row.get(0)?,
        task: row.get(1)?,
        error_message: row.get(2)?,
        attempts: row.get(3)?,
        failed_at: parse_timestamp(&row.get::<_, String>(4)?),
    })
}

/// Record a task that exhausted its retry budget.
pub fn record_dead_letter(
    conn: &Connection,
    task: &str,
    error_message: &str,
    attempts: u32,
) -> Result<DeadLetter> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO dead_letters (id, task, error_message, attempts, failed_at)
         VALUES (?, ?, ?, ?, ?)",
        params![id, task, error_message, attempts, now.to_rfc3339()],
    )
    .map_err(|e| DbError::database(e.to_string()))?;

    Ok(DeadLetter {
        id,
        task: task.to_string(),
        error_message: error_message.to_string(),
        attempts,
        failed_at: now,
    })
}

/// List dead letters, newest first.
pub fn list_dead_letters(conn: &Connection, limit: i64) -> Result<Vec<DeadLetter>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, task, error_message, attempts, failed_at
             FROM dead_letters ORDER BY failed_at DESC LIMIT ?",
        )
        .map_err(|e| DbError::database(e.to_string()))?;

    let rows = stmt
        .query_map(params![limit], map_dead_letter)
        .map_err(|e| DbError::database(e.to_string()))?;

    let mut letters = Vec::new();
    for row in rows {
        letters.push(row.map_err(|e| DbError::database(e.to_string()))?);
    }
    Ok(letters)
}
