//! Fire-and-forget audit event recording.
//!
//! Call sites hand an event to [`AuditLogger::record`] and move on; the
//! task queue persists it with bounded retry, and a persistence failure
//! never propagates back to the caller. Use
//! [`AuditLogger::record_after_commit`] from inside a transaction so the
//! event is enqueued only if that transaction commits.

use serde_json::Value;
use stellar_common::GenerationError;
use stellar_db::models::NewEventLogEntry;
use stellar_db::pool::{get_conn, DbPool};
use stellar_db::queries::event_log;
use tracing::error;

use crate::queue::{QueueClosed, Task, TaskQueue, UnitOfWork};

/// Network/client metadata attached to an audit event.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

/// Handle for recording audit events through the task queue.
pub struct AuditLogger {
    queue: TaskQueue,
}

impl AuditLogger {
    /// Create a new audit logger submitting to the given queue.
    pub fn new(queue: TaskQueue) -> Self {
        Self { queue }
    }

    /// Queue an audit event for durable recording. Never blocks.
    ///
    /// An empty-string `user_id` is normalized to absent before persistence.
    pub fn record(
        &self,
        event_type: &str,
        user_id: Option<&str>,
        payload: Value,
        client: ClientInfo,
    ) -> Result<(), QueueClosed> {
        self.queue.submit(Task::RecordEvent {
            entry: build_entry(event_type, user_id, payload, client),
        })
    }

    /// Defer an audit event on a unit of work so it is enqueued only if the
    /// wrapping transaction commits.
    pub fn record_after_commit(
        uow: &mut UnitOfWork<'_>,
        event_type: &str,
        user_id: Option<&str>,
        payload: Value,
        client: ClientInfo,
    ) {
        uow.defer(Task::RecordEvent {
            entry: build_entry(event_type, user_id, payload, client),
        });
    }
}

/// Build an entry, normalizing an empty-string user id to absent.
fn build_entry(
    event_type: &str,
    user_id: Option<&str>,
    payload: Value,
    client: ClientInfo,
) -> NewEventLogEntry {
    NewEventLogEntry {
        event_type: event_type.to_string(),
        user_id: user_id.filter(|u| !u.is_empty()).map(String::from),
        payload,
        ip_address: client.ip_address,
        user_agent: client.user_agent,
        session_id: client.session_id,
    }
}

/// Persist a queued audit event.
///
/// Failures are logged with their full chain and re-raised so the task
/// queue's retry policy applies.
pub(crate) fn persist_event(
    pool: &DbPool,
    entry: &NewEventLogEntry,
) -> Result<(), GenerationError> {
    let conn = get_conn(pool).map_err(|e| GenerationError::storage().with_source(e))?;

    match event_log::insert_event(&conn, entry) {
        Ok(_) => Ok(()),
        Err(err) => {
            error!(
                event_type = %entry.event_type,
                error = ?err,
                "Failed to persist audit event"
            );
            Err(GenerationError::storage().with_source(err))
        }
    }
}
