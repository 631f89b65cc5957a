//! Application-wide events for observability.
//!
//! The dispatcher and the task worker broadcast [`AppEvent`]s so embedding
//! code (game server, CLI, tests) can observe pipeline outcomes without
//! polling the database. Sending with no subscribers is not an error.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Event broadcast by the generation pipeline.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A resource finished generating and was approved.
    ResourceApproved {
        resource_id: String,
        output_path: String,
    },
    /// A generation attempt failed; the resource was reverted to pending.
    ResourceFailed { resource_id: String, error: String },
    /// A task exhausted its retry budget and was recorded as a dead letter.
    TaskDeadLettered {
        task: String,
        error: String,
        attempts: u32,
    },
}

/// Sender half of the application event channel.
pub type EventSender = broadcast::Sender<AppEvent>;

/// Create the application event channel.
pub fn channel() -> (EventSender, broadcast::Receiver<AppEvent>) {
    broadcast::channel(CHANNEL_CAPACITY)
}
