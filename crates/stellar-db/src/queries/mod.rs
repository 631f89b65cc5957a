//! Database query operations, one module per table.

pub mod dead_letters;
pub mod event_log;
pub mod resources;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Parse an RFC 3339 timestamp column, falling back to now on corrupt data.
pub(crate) fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse a UUID column, reporting corrupt data as a conversion failure so
/// it propagates as a query error instead of panicking mid-row.
pub(crate) fn parse_uuid(idx: usize, value: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
