//! Resource generation: providers, artifact storage, and the dispatcher.

pub mod dispatcher;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod storage;

pub use dispatcher::{GenerationDispatcher, ProviderSelection};
pub use provider::{GeneratedMedia, GenerationProvider};
pub use registry::ProviderRegistry;
pub use storage::MediaStorage;

use rusqlite::Connection;
use stellar_common::{GenerationError, PlanetId, ResourceKind, ResourceStatus, UserId};
use stellar_db::models::Resource;
use stellar_db::pool::{get_conn, DbPool};
use stellar_db::queries::resources;
use stellar_db::DbError;
use tracing::{info, warn};

use crate::audit::{AuditLogger, ClientInfo};
use crate::queue::{Task, TaskQueue, UnitOfWork};

fn storage_err(e: DbError) -> GenerationError {
    GenerationError::storage().with_source(e)
}

/// Create a resource, claim it for generation, and enqueue its task.
///
/// Everything runs in one transaction; the generation task and the audit
/// event are enqueued only after that transaction commits, so a rolled-back
/// request can never leave a task or an audit record behind.
pub fn request_generation(
    conn: &mut Connection,
    queue: &TaskQueue,
    kind: ResourceKind,
    user_id: Option<UserId>,
    planet_id: Option<PlanetId>,
    prompt: &str,
) -> Result<Resource, GenerationError> {
    let mut uow = UnitOfWork::begin(conn).map_err(storage_err)?;

    let resource = resources::create_resource(uow.connection(), kind, user_id, planet_id, prompt)
        .map_err(storage_err)?;
    if !resources::mark_generating(uow.connection(), resource.id).map_err(storage_err)? {
        return Err(
            GenerationError::storage().with_message("Freshly created resource could not be claimed.")
        );
    }

    let actor = user_id.map(|u| u.to_string());
    AuditLogger::record_after_commit(
        &mut uow,
        "resource.requested",
        actor.as_deref(),
        serde_json::json!({
            "resource_id": resource.id.to_string(),
            "kind": kind.to_string(),
        }),
        ClientInfo::default(),
    );
    uow.defer(Task::GenerateResource {
        resource_id: resource.id,
    });

    uow.commit(queue).map_err(storage_err)?;
    info!(resource_id = %resource.id, kind = %kind, "Queued resource for generation");

    Ok(Resource {
        status: ResourceStatus::Generating,
        ..resource
    })
}

/// Re-enqueue every `pending` resource.
///
/// Run at worker startup: pending rows are either reverted failures or
/// resources recovered by `reset_orphaned`, both of which are waiting for
/// another attempt.
pub fn requeue_pending(pool: &DbPool, queue: &TaskQueue) -> Result<usize, GenerationError> {
    let conn = get_conn(pool).map_err(storage_err)?;
    let pending =
        resources::list_by_status(&conn, ResourceStatus::Pending, i64::MAX).map_err(storage_err)?;

    let mut requeued = 0;
    for resource in pending {
        if !resources::mark_generating(&conn, resource.id).map_err(storage_err)? {
            warn!(resource_id = %resource.id, "Pending resource claimed elsewhere; skipping");
            continue;
        }
        if queue
            .submit(Task::GenerateResource {
                resource_id: resource.id,
            })
            .is_err()
        {
            // Queue already shut down; leave the resource claimable again.
            resources::revert_to_pending(&conn, resource.id, "Task queue closed during requeue")
                .map_err(storage_err)?;
            break;
        }
        requeued += 1;
    }

    Ok(requeued)
}
