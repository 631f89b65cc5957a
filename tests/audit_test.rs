//! Integration tests for the audit logger: user-id normalization, durable
//! persistence through the queue, and retry-then-dead-letter on failure.

mod common;

use std::time::Instant;

use common::{fast_policy, wait_for, TestHarness};
use stellar::audit::{AuditLogger, ClientInfo};
use stellar_db::pool::get_conn;
use stellar_db::queries::{dead_letters, event_log};

#[tokio::test]
async fn empty_user_id_persists_as_absent() {
    let harness = TestHarness::new();
    let dispatcher = harness.dispatcher(vec![], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());
    let audit = AuditLogger::new(queue);

    audit
        .record(
            "player.login",
            Some(""),
            serde_json::json!({"client": "web"}),
            ClientInfo::default(),
        )
        .unwrap();

    wait_for("audit entry", || {
        let conn = get_conn(&harness.pool).unwrap();
        !event_log::list_recent(&conn, 10).unwrap().is_empty()
    })
    .await;

    let conn = get_conn(&harness.pool).unwrap();
    let entries = event_log::list_recent(&conn, 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].event_type, "player.login");
    assert_eq!(entries[0].user_id, None);
    assert_eq!(entries[0].payload["client"], "web");
}

#[tokio::test]
async fn present_user_id_and_client_info_persist() {
    let harness = TestHarness::new();
    let dispatcher = harness.dispatcher(vec![], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());
    let audit = AuditLogger::new(queue);

    audit
        .record(
            "planet.colonized",
            Some("navigator-7"),
            serde_json::json!({"planet": "Kepler-442b"}),
            ClientInfo {
                ip_address: Some("10.0.0.7".to_string()),
                user_agent: Some("stellar-client/2.1".to_string()),
                session_id: Some("sess-1".to_string()),
            },
        )
        .unwrap();

    wait_for("audit entry", || {
        let conn = get_conn(&harness.pool).unwrap();
        !event_log::list_recent(&conn, 10).unwrap().is_empty()
    })
    .await;

    let conn = get_conn(&harness.pool).unwrap();
    let entries = event_log::list_recent(&conn, 10).unwrap();
    assert_eq!(entries[0].user_id, Some("navigator-7".to_string()));
    assert_eq!(entries[0].ip_address, Some("10.0.0.7".to_string()));
    assert_eq!(entries[0].session_id, Some("sess-1".to_string()));
}

#[tokio::test]
async fn failing_persistence_retries_then_dead_letters() {
    let harness = TestHarness::new();
    {
        // Break the event log so every insert fails.
        let conn = get_conn(&harness.pool).unwrap();
        conn.execute_batch("DROP TABLE event_log;").unwrap();
    }

    let dispatcher = harness.dispatcher(vec![], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());
    let audit = AuditLogger::new(queue);

    let started = Instant::now();
    audit
        .record("doomed.event", None, serde_json::json!({}), ClientInfo::default())
        .unwrap();

    wait_for("dead letter", || {
        let conn = get_conn(&harness.pool).unwrap();
        !dead_letters::list_dead_letters(&conn, 10).unwrap().is_empty()
    })
    .await;

    // Three attempts with two fixed delays between them.
    assert!(started.elapsed() >= std::time::Duration::from_millis(50));

    let conn = get_conn(&harness.pool).unwrap();
    let letters = dead_letters::list_dead_letters(&conn, 10).unwrap();
    assert_eq!(letters.len(), 1);
    assert_eq!(letters[0].task, "record_event:doomed.event");
    assert_eq!(letters[0].attempts, 3);
    assert!(letters[0].error_message.contains("Storage operation failed."));

    // The worker survives a dead-lettered task and keeps processing.
    conn.execute_batch(
        "CREATE TABLE event_log (
            id TEXT PRIMARY KEY NOT NULL,
            event_type TEXT NOT NULL,
            user_id TEXT,
            payload TEXT NOT NULL,
            ip_address TEXT,
            user_agent TEXT,
            session_id TEXT,
            created_at TEXT NOT NULL
        );",
    )
    .unwrap();
    drop(conn);

    audit
        .record("phoenix.event", None, serde_json::json!({}), ClientInfo::default())
        .unwrap();

    wait_for("post-dead-letter entry", || {
        let conn = get_conn(&harness.pool).unwrap();
        !event_log::list_by_type(&conn, "phoenix.event", 10).unwrap().is_empty()
    })
    .await;
}
