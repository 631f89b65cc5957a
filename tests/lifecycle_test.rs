//! End-to-end lifecycle tests: request a resource, let the queue worker
//! drive it, and observe the terminal state plus the audit trail.

mod common;

use std::sync::Arc;

use common::{fast_policy, wait_for, StubOutcome, StubProvider, TestHarness};
use stellar::generation;
use stellar_common::{ResourceKind, ResourceStatus, UserId};
use stellar_db::pool::get_conn;
use stellar_db::queries::{dead_letters, event_log, resources};

#[tokio::test]
async fn request_generation_runs_to_approval() {
    let harness = TestHarness::new();
    let stub = StubProvider::new("openai", StubOutcome::Succeed);
    let dispatcher = harness.dispatcher(vec![Arc::new(stub)], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());

    let user = UserId::new();
    let resource = {
        let mut conn = get_conn(&harness.pool).unwrap();
        generation::request_generation(
            &mut conn,
            &queue,
            ResourceKind::AvatarImage,
            Some(user),
            None,
            "an explorer in a worn vac suit",
        )
        .unwrap()
    };
    assert_eq!(resource.status, ResourceStatus::Generating);

    wait_for("resource approval", || {
        let conn = get_conn(&harness.pool).unwrap();
        resources::get_resource(&conn, resource.id).unwrap().status == ResourceStatus::Approved
    })
    .await;

    // The artifact landed on disk.
    let conn = get_conn(&harness.pool).unwrap();
    let fetched = resources::get_resource(&conn, resource.id).unwrap();
    let output_path = fetched.output_path.unwrap();
    assert_eq!(std::fs::read(&output_path).unwrap(), b"stub-image");
    drop(conn);

    // The request was audited after commit.
    wait_for("audit entry", || {
        let conn = get_conn(&harness.pool).unwrap();
        !event_log::list_by_type(&conn, "resource.requested", 10).unwrap().is_empty()
    })
    .await;

    let conn = get_conn(&harness.pool).unwrap();
    let entries = event_log::list_by_type(&conn, "resource.requested", 10).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].user_id, Some(user.to_string()));
    assert_eq!(entries[0].payload["resource_id"], resource.id.to_string());
    assert_eq!(entries[0].payload["kind"], "avatar_image");
}

#[tokio::test]
async fn failed_generation_ends_pending_without_dead_letter() {
    let harness = TestHarness::new();
    let stub = StubProvider::new("openai", StubOutcome::FailApi);
    let dispatcher = harness.dispatcher(vec![Arc::new(stub)], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());

    let resource = {
        let mut conn = get_conn(&harness.pool).unwrap();
        generation::request_generation(
            &mut conn,
            &queue,
            ResourceKind::PlanetImage,
            None,
            None,
            "a ringed gas giant",
        )
        .unwrap()
    };

    wait_for("resource reversion", || {
        let conn = get_conn(&harness.pool).unwrap();
        let fetched = resources::get_resource(&conn, resource.id).unwrap();
        fetched.status == ResourceStatus::Pending && fetched.error_message.is_some()
    })
    .await;

    let conn = get_conn(&harness.pool).unwrap();
    let fetched = resources::get_resource(&conn, resource.id).unwrap();
    assert_eq!(fetched.error_message, Some("stub upstream exploded".to_string()));

    // The queue's redelivery observed the reverted status and treated it as
    // a benign no-op, so nothing was dead-lettered.
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    assert!(dead_letters::list_dead_letters(&conn, 10).unwrap().is_empty());
}

#[tokio::test]
async fn requeue_pending_drives_reverted_resources_to_completion() {
    let harness = TestHarness::new();
    let stub = StubProvider::new("openai", StubOutcome::Succeed);
    let dispatcher = harness.dispatcher(vec![Arc::new(stub)], "openai", "replicate");
    let queue = harness.queue(dispatcher, fast_policy());

    // A pending resource, as left behind by a reverted failure or an
    // orphan reset.
    let resource = {
        let conn = get_conn(&harness.pool).unwrap();
        resources::create_resource(&conn, ResourceKind::PlanetImage, None, None, "a dust ring")
            .unwrap()
    };

    let requeued = generation::requeue_pending(&harness.pool, &queue).unwrap();
    assert_eq!(requeued, 1);

    wait_for("resource approval", || {
        let conn = get_conn(&harness.pool).unwrap();
        resources::get_resource(&conn, resource.id).unwrap().status == ResourceStatus::Approved
    })
    .await;
}
