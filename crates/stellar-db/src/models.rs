//! Internal Rust models matching the database schema.
//!
//! This module provides strongly-typed structures that map to database
//! tables. All models use types from stellar-common where appropriate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stellar_common::{EventId, PlanetId, ResourceId, ResourceKind, ResourceStatus, UserId};

/// A requested media artifact and its generation lifecycle.
///
/// The owning references (`user_id`, `planet_id`) are opaque to the
/// pipeline; avatar resources usually carry a user, planet resources a
/// planet, but nothing here depends on it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub status: ResourceStatus,
    pub user_id: Option<UserId>,
    pub planet_id: Option<PlanetId>,
    pub prompt: String,
    pub output_path: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted audit event. Never updated or deleted by this service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventLogEntry {
    pub id: EventId,
    pub event_type: String,
    /// Opaque actor identifier. Absent for system-originated events.
    pub user_id: Option<String>,
    pub payload: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An audit event awaiting persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEventLogEntry {
    pub event_type: String,
    pub user_id: Option<String>,
    pub payload: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub session_id: Option<String>,
}

/// A task that exhausted its retry budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeadLetter {
    pub id: String,
    pub task: String,
    pub error_message: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}
