//! Trait definition and types for generation providers.
//!
//! This module defines the [`GenerationProvider`] trait that all generation
//! backends (OpenAI, Replicate, etc.) must implement, along with the shared
//! artifact type returned by generation calls.

use async_trait::async_trait;
use stellar_common::GenerationError;

/// A finished media artifact as returned by a provider.
#[derive(Debug, Clone)]
pub struct GeneratedMedia {
    /// Raw artifact bytes.
    pub bytes: Vec<u8>,
    /// Container/extension label, e.g. `"png"` or `"mp4"`.
    pub format: String,
}

/// Async trait that all generation providers must implement.
///
/// Each provider wraps a single external API and exposes a uniform interface
/// for producing images and videos from a text prompt. A provider that does
/// not offer one of the services rejects it with
/// [`GenerationError::unsupported_provider_for`].
///
/// Providers are expected to be wrapped in an `Arc` so they can be shared
/// across tasks.
#[async_trait]
pub trait GenerationProvider: std::fmt::Debug + Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"openai"`).
    fn name(&self) -> &'static str;

    /// Returns `true` when the provider has been configured with valid
    /// credentials and is ready to serve requests.
    fn is_configured(&self) -> bool;

    /// Generate a single image from `prompt`.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedMedia, GenerationError>;

    /// Generate a single video from `prompt`.
    async fn generate_video(&self, prompt: &str) -> Result<GeneratedMedia, GenerationError>;
}
