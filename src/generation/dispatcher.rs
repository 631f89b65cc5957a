//! Generation job dispatcher.
//!
//! Executes exactly one generation attempt for a resource. The dispatcher
//! re-reads the resource's persisted status immediately before acting, so a
//! cancel or edit that happened between enqueue and execution turns the task
//! into a logged no-op instead of a duplicate generation. All failures are
//! logged, reconciled (the resource reverts to `pending`), and re-raised
//! unchanged so the task queue's retry policy sees the true failure kind.

use std::sync::Arc;

use stellar_common::{GenerationError, ResourceId, ResourceKind, ResourceStatus};
use stellar_db::models::Resource;
use stellar_db::pool::{get_conn, DbPool};
use stellar_db::queries::resources;
use stellar_db::DbError;
use tracing::{debug, error, info, warn};

use crate::config::ProvidersConfig;
use crate::events::{AppEvent, EventSender};
use crate::generation::provider::GeneratedMedia;
use crate::generation::registry::ProviderRegistry;
use crate::generation::storage::MediaStorage;

/// Which registered provider serves each media service, by registry name.
#[derive(Debug, Clone)]
pub struct ProviderSelection {
    pub image: String,
    pub video: String,
}

impl ProviderSelection {
    /// Build the selection from the providers config section.
    pub fn from_config(providers: &ProvidersConfig) -> Self {
        Self {
            image: providers.image_provider.clone(),
            video: providers.video_provider.clone(),
        }
    }
}

/// Executes generation attempts and reconciles resource status on failure.
pub struct GenerationDispatcher {
    pool: DbPool,
    registry: Arc<ProviderRegistry>,
    storage: MediaStorage,
    selection: ProviderSelection,
    event_tx: Option<EventSender>,
}

impl GenerationDispatcher {
    /// Create a new dispatcher.
    pub fn new(
        pool: DbPool,
        registry: Arc<ProviderRegistry>,
        storage: MediaStorage,
        selection: ProviderSelection,
    ) -> Self {
        Self {
            pool,
            registry,
            storage,
            selection,
            event_tx: None,
        }
    }

    /// Create a new dispatcher with event broadcasting.
    pub fn with_events(
        pool: DbPool,
        registry: Arc<ProviderRegistry>,
        storage: MediaStorage,
        selection: ProviderSelection,
        event_tx: EventSender,
    ) -> Self {
        Self {
            pool,
            registry,
            storage,
            selection,
            event_tx: Some(event_tx),
        }
    }

    /// Broadcast an event if the event sender is configured.
    fn broadcast(&self, event: AppEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                debug!("No subscribers for generation event");
            }
        }
    }

    /// Execute one generation attempt for the resource.
    ///
    /// A missing row or a status other than `generating` is a benign no-op:
    /// the record changed between enqueue and execution and retrying cannot
    /// help. Running this twice for the same resource is safe for the same
    /// reason; the second run observes the advanced status and does nothing.
    pub async fn execute(&self, resource_id: ResourceId) -> Result<(), GenerationError> {
        let resource = {
            let conn =
                get_conn(&self.pool).map_err(|e| GenerationError::storage().with_source(e))?;
            match resources::get_resource(&conn, resource_id) {
                Ok(resource) => resource,
                Err(DbError::NotFound(_)) => {
                    warn!(
                        resource_id = %resource_id,
                        "Resource vanished before generation; skipping"
                    );
                    return Ok(());
                }
                Err(e) => return Err(GenerationError::storage().with_source(e)),
            }
        };

        if resource.status != ResourceStatus::Generating {
            warn!(
                resource_id = %resource.id,
                status = %resource.status,
                "Resource is not awaiting generation; skipping"
            );
            return Ok(());
        }

        let outcome = match resource.kind {
            ResourceKind::AvatarImage => self.generate_avatar_image(&resource).await,
            ResourceKind::PlanetImage => self.generate_planet_image(&resource).await,
            ResourceKind::PlanetVideo => self.generate_planet_video(&resource).await,
        };

        if let Err(err) = outcome {
            error!(
                resource_id = %resource.id,
                error = %err,
                "Resource generation failed"
            );
            self.revert_best_effort(resource.id, &err);
            self.broadcast(AppEvent::ResourceFailed {
                resource_id: resource.id.to_string(),
                error: err.to_string(),
            });
            return Err(err);
        }

        Ok(())
    }

    async fn generate_avatar_image(&self, resource: &Resource) -> Result<(), GenerationError> {
        let provider = self.registry.image_provider(&self.selection.image)?;
        let media = provider.generate_image(&resource.prompt).await?;
        self.finish(resource, &media)
    }

    async fn generate_planet_image(&self, resource: &Resource) -> Result<(), GenerationError> {
        let provider = self.registry.image_provider(&self.selection.image)?;
        let media = provider.generate_image(&resource.prompt).await?;
        self.finish(resource, &media)
    }

    async fn generate_planet_video(&self, resource: &Resource) -> Result<(), GenerationError> {
        let provider = self.registry.video_provider(&self.selection.video)?;
        let media = provider.generate_video(&resource.prompt).await?;
        self.finish(resource, &media)
    }

    /// Store the artifact and approve the resource.
    fn finish(&self, resource: &Resource, media: &GeneratedMedia) -> Result<(), GenerationError> {
        let stored = self.storage.store(resource.id, media)?;
        let output_path = stored.path.to_string_lossy().to_string();

        let conn = get_conn(&self.pool).map_err(|e| GenerationError::storage().with_source(e))?;
        let approved = resources::approve(&conn, resource.id, &output_path)
            .map_err(|e| GenerationError::storage().with_source(e))?;

        if approved {
            info!(
                resource_id = %resource.id,
                output_path = %output_path,
                "Resource approved"
            );
            self.broadcast(AppEvent::ResourceApproved {
                resource_id: resource.id.to_string(),
                output_path,
            });
        } else {
            warn!(
                resource_id = %resource.id,
                "Resource left generating state during the attempt; artifact kept at {}",
                stored.path.display()
            );
        }

        Ok(())
    }

    /// Revert the resource to `pending` after a failed attempt.
    ///
    /// Reconciliation is best-effort: if it fails, the original generation
    /// error is still what propagates to the caller.
    fn revert_best_effort(&self, resource_id: ResourceId, err: &GenerationError) {
        match get_conn(&self.pool) {
            Ok(conn) => match resources::revert_to_pending(&conn, resource_id, err.message()) {
                Ok(true) => {}
                Ok(false) => warn!(
                    resource_id = %resource_id,
                    "Resource left generating state before reversion"
                ),
                Err(db_err) => error!(
                    resource_id = %resource_id,
                    error = %db_err,
                    "Failed to revert resource to pending"
                ),
            },
            Err(e) => error!(
                resource_id = %resource_id,
                error = %e,
                "Failed to revert resource to pending"
            ),
        }
    }
}
