//! Stellar-Common: Shared types for the stellar generation pipeline.
//!
//! This crate provides the pieces shared by every other stellar crate:
//!
//! - **Typed IDs**: Type-safe UUID wrappers for resources, users, planets,
//!   and event-log entries
//! - **Core Types**: The resource kind and lifecycle status enums
//! - **Error Taxonomy**: [`GenerationError`], the closed set of typed
//!   failures raised by the generation pipeline
//!
//! # Examples
//!
//! ```
//! use stellar_common::{GenerationError, ResourceId, ResourceKind, ResourceStatus};
//!
//! let id = ResourceId::new();
//! let kind = ResourceKind::PlanetImage;
//! assert_eq!(ResourceStatus::Generating.to_string(), "generating");
//!
//! let err = GenerationError::provider_configuration("openai");
//! assert_eq!(err.code(), 500);
//! ```

pub mod error;
pub mod ids;
pub mod types;

pub use error::GenerationError;
pub use ids::*;
pub use types::*;
