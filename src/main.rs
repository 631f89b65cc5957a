mod cli;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use tokio::sync::broadcast;

use stellar::config::{self, Config};
use stellar::events::{self, AppEvent, EventSender};
use stellar::generation::{
    self, GenerationDispatcher, MediaStorage, ProviderRegistry, ProviderSelection,
};
use stellar::generation::providers::{OpenAiProvider, ReplicateProvider};
use stellar::queue::{RetryPolicies, TaskQueue, WorkerContext};
use stellar_common::{PlanetId, ResourceKind, UserId};
use stellar_db::pool::{get_conn, init_pool, DbPool};
use stellar_db::queries::resources;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on the
    // verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "stellar=trace,stellar_db=debug,stellar_common=debug".to_string()
        } else {
            "stellar=debug,stellar_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Worker => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_worker(cli.config.as_deref()))
        }
        Commands::Request {
            kind,
            prompt,
            user,
            planet,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_request(cli.config.as_deref(), kind, prompt, user, planet))
        }
        Commands::Validate { config } => validate(config.or(cli.config).as_deref()),
        Commands::Version => {
            println!("stellar {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize the database, providers, dispatcher, and task queue.
fn build_stack(config: &Config) -> Result<(DbPool, TaskQueue, EventSender)> {
    let db_path = config.database.path.to_string_lossy();
    tracing::info!("Initializing database at {}", db_path);
    let pool = init_pool(&db_path)?;

    // Recover resources stranded in `generating` by a previous session
    if let Ok(conn) = pool.get() {
        match resources::reset_orphaned(&conn) {
            Ok(count) if count > 0 => {
                tracing::info!("Reset {} orphaned resources from previous session", count);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Failed to reset orphaned resources: {}", e);
            }
        }
    }

    let (event_tx, _) = events::channel();

    let mut registry = ProviderRegistry::new();
    registry.register(Arc::new(OpenAiProvider::new(&config.providers.openai)));
    registry.register(Arc::new(ReplicateProvider::new(&config.providers.replicate)));

    let storage = MediaStorage::new(config.storage.media_dir.clone());
    let dispatcher = GenerationDispatcher::with_events(
        pool.clone(),
        Arc::new(registry),
        storage,
        ProviderSelection::from_config(&config.providers),
        event_tx.clone(),
    );

    let ctx = WorkerContext {
        pool: pool.clone(),
        dispatcher: Arc::new(dispatcher),
        event_tx: Some(event_tx.clone()),
    };
    let queue = TaskQueue::start(ctx, RetryPolicies::from_config(&config.queue));

    Ok((pool, queue, event_tx))
}

async fn run_worker(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    tracing::info!("Starting Stellar generation worker");

    let (pool, queue, _event_tx) = build_stack(&config)?;

    match generation::requeue_pending(&pool, &queue) {
        Ok(count) if count > 0 => tracing::info!("Requeued {} pending resources", count),
        Ok(_) => {}
        Err(e) => tracing::warn!("Failed to requeue pending resources: {}", e),
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutting down");

    Ok(())
}

async fn run_request(
    config_path: Option<&Path>,
    kind: String,
    prompt: String,
    user: Option<String>,
    planet: Option<String>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let kind: ResourceKind = kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .context("Unknown resource kind")?;
    let user_id: Option<UserId> = user
        .map(|s| s.parse())
        .transpose()
        .context("Invalid user id")?;
    let planet_id: Option<PlanetId> = planet
        .map(|s| s.parse())
        .transpose()
        .context("Invalid planet id")?;

    let (pool, queue, event_tx) = build_stack(&config)?;
    let mut events = event_tx.subscribe();

    let resource = {
        let mut conn = get_conn(&pool)?;
        generation::request_generation(&mut conn, &queue, kind, user_id, planet_id, &prompt)?
    };
    println!("Requested {} resource {}", resource.kind, resource.id);

    // Wait for the worker to report this resource's outcome
    loop {
        match events.recv().await {
            Ok(AppEvent::ResourceApproved {
                resource_id,
                output_path,
            }) if resource_id == resource.id.to_string() => {
                println!("Approved: {}", output_path);
                return Ok(());
            }
            Ok(AppEvent::ResourceFailed { resource_id, error })
                if resource_id == resource.id.to_string() =>
            {
                anyhow::bail!("Generation failed: {}", error);
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => {
                anyhow::bail!("Event stream closed before the resource finished");
            }
        }
    }
}

fn validate(path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(path)?;
    println!("Configuration OK");
    println!("  database:       {}", config.database.path.display());
    println!("  media dir:      {}", config.storage.media_dir.display());
    println!("  image provider: {}", config.providers.image_provider);
    println!("  video provider: {}", config.providers.video_provider);
    Ok(())
}
