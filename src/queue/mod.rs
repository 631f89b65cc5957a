//! Asynchronous task queue with bounded retry and dead-letter routing.
//!
//! The [`TaskQueue`] accepts [`Task`] submissions and processes them in a
//! spawned background worker. Submission never blocks the caller. Each task
//! kind carries a [`RetryPolicy`]: a failing task is re-run with a fixed
//! delay between attempts, and a task that exhausts its budget is recorded
//! in the dead-letters table instead of being dropped. The worker runs until
//! all [`TaskQueue`] handles are dropped, at which point the channel closes
//! and the task exits gracefully.

pub mod uow;

pub use uow::UnitOfWork;

use std::sync::Arc;
use std::time::Duration;

use stellar_common::{GenerationError, ResourceId};
use stellar_db::models::NewEventLogEntry;
use stellar_db::pool::{get_conn, DbPool};
use stellar_db::queries::dead_letters;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::audit;
use crate::config::QueueConfig;
use crate::events::{AppEvent, EventSender};
use crate::generation::GenerationDispatcher;

/// A unit of work executed by the queue worker.
#[derive(Debug, Clone)]
pub enum Task {
    /// Run one generation attempt for a resource.
    GenerateResource { resource_id: ResourceId },
    /// Durably record an audit event.
    RecordEvent { entry: NewEventLogEntry },
}

impl Task {
    /// Short human-readable label used in logs and dead letters.
    pub fn describe(&self) -> String {
        match self {
            Self::GenerateResource { resource_id } => {
                format!("generate_resource:{resource_id}")
            }
            Self::RecordEvent { entry } => format!("record_event:{}", entry.event_type),
        }
    }
}

/// Retry budget for one task kind: total attempts and the fixed delay
/// between them. No exponential backoff, no jitter.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

/// Per-task-kind retry policies.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicies {
    pub generation: RetryPolicy,
    pub audit: RetryPolicy,
}

impl RetryPolicies {
    /// Build the policies from the queue config section.
    pub fn from_config(config: &QueueConfig) -> Self {
        Self {
            generation: RetryPolicy {
                max_attempts: config.generation_attempts,
                delay: Duration::from_secs(config.generation_retry_delay_secs),
            },
            audit: RetryPolicy {
                max_attempts: config.audit_attempts,
                delay: Duration::from_secs(config.audit_retry_delay_secs),
            },
        }
    }

    fn for_task(&self, task: &Task) -> RetryPolicy {
        match task {
            Task::GenerateResource { .. } => self.generation,
            Task::RecordEvent { .. } => self.audit,
        }
    }
}

impl Default for RetryPolicies {
    fn default() -> Self {
        Self::from_config(&QueueConfig::default())
    }
}

/// Error returned when submitting to a queue whose worker has stopped.
#[derive(Debug, thiserror::Error)]
#[error("Task queue is closed")]
pub struct QueueClosed;

/// Everything the worker needs to execute tasks.
pub struct WorkerContext {
    pub pool: DbPool,
    pub dispatcher: Arc<GenerationDispatcher>,
    pub event_tx: Option<EventSender>,
}

/// Handle to the background task worker.
#[derive(Clone)]
pub struct TaskQueue {
    sender: mpsc::UnboundedSender<Task>,
}

impl TaskQueue {
    /// Spawn the worker and return a handle for submitting tasks.
    pub fn start(ctx: WorkerContext, policies: RetryPolicies) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();

        tokio::spawn(run_worker(receiver, ctx, policies));

        Self { sender }
    }

    /// Submit a task. Never blocks; fails only if the worker has stopped.
    pub fn submit(&self, task: Task) -> Result<(), QueueClosed> {
        self.sender.send(task).map_err(|_| QueueClosed)
    }
}

/// Background loop that drains the task channel.
async fn run_worker(
    mut receiver: mpsc::UnboundedReceiver<Task>,
    ctx: WorkerContext,
    policies: RetryPolicies,
) {
    info!("Task worker started");

    while let Some(task) = receiver.recv().await {
        let policy = policies.for_task(&task);
        let label = task.describe();

        if let Err(err) = run_with_retry(&label, policy, || execute_task(&ctx, &task)).await {
            error!(
                task = %label,
                error = %err,
                attempts = policy.max_attempts,
                "Task exhausted its retry budget; recording dead letter"
            );
            record_dead_letter(&ctx, &label, &err, policy.max_attempts);
        }
    }

    info!("Task worker stopped");
}

/// Run `op` up to `policy.max_attempts` times with a fixed delay between
/// attempts, returning the last error once the budget is spent.
async fn run_with_retry<F, Fut>(
    label: &str,
    policy: RetryPolicy,
    mut op: F,
) -> Result<(), GenerationError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<(), GenerationError>>,
{
    let mut attempt = 1u32;
    loop {
        match op().await {
            Ok(()) => return Ok(()),
            Err(err) if attempt >= policy.max_attempts => return Err(err),
            Err(err) => {
                warn!(
                    task = %label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    error = %err,
                    "Task attempt failed; retrying"
                );
                attempt += 1;
                sleep(policy.delay).await;
            }
        }
    }
}

async fn execute_task(ctx: &WorkerContext, task: &Task) -> Result<(), GenerationError> {
    match task {
        Task::GenerateResource { resource_id } => ctx.dispatcher.execute(*resource_id).await,
        Task::RecordEvent { entry } => audit::persist_event(&ctx.pool, entry),
    }
}

fn record_dead_letter(ctx: &WorkerContext, label: &str, err: &GenerationError, attempts: u32) {
    match get_conn(&ctx.pool) {
        Ok(conn) => {
            if let Err(db_err) =
                dead_letters::record_dead_letter(&conn, label, &err.to_string(), attempts)
            {
                error!(task = %label, error = %db_err, "Failed to record dead letter");
            }
        }
        Err(e) => error!(task = %label, error = %e, "Failed to record dead letter"),
    }

    if let Some(ref tx) = ctx.event_tx {
        let _ = tx.send(AppEvent::TaskDeadLettered {
            task: label.to_string(),
            error: err.to_string(),
            attempts,
        });
    }
}
