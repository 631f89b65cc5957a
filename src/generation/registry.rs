//! Provider registry for managing multiple [`GenerationProvider`] implementations.
//!
//! The [`ProviderRegistry`] aggregates generation providers and resolves the
//! provider configured for a given service, turning bad selections into the
//! pipeline's typed errors: an unknown name is an unsupported provider, a
//! known but credential-less one is a configuration error.

use std::sync::Arc;

use stellar_common::GenerationError;

use super::provider::GenerationProvider;

/// A registry that manages multiple [`GenerationProvider`] implementations.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn GenerationProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry with no providers.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Register a new generation provider.
    pub fn register(&mut self, provider: Arc<dyn GenerationProvider>) {
        self.providers.push(provider);
    }

    /// Look up a provider by its [`GenerationProvider::name`].
    ///
    /// Returns `None` if no provider with the given name has been registered.
    pub fn get(&self, name: &str) -> Option<&dyn GenerationProvider> {
        self.providers
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    /// Resolve the provider serving image generation.
    ///
    /// # Errors
    ///
    /// * [`GenerationError::UnsupportedProvider`] - no provider with this name
    /// * [`GenerationError::ProviderConfiguration`] - registered but not configured
    pub fn image_provider(&self, name: &str) -> Result<&dyn GenerationProvider, GenerationError> {
        self.resolve(name, "image")
    }

    /// Resolve the provider serving video generation.
    ///
    /// # Errors
    ///
    /// * [`GenerationError::UnsupportedProvider`] - no provider with this name
    /// * [`GenerationError::ProviderConfiguration`] - registered but not configured
    pub fn video_provider(&self, name: &str) -> Result<&dyn GenerationProvider, GenerationError> {
        self.resolve(name, "video")
    }

    fn resolve(
        &self,
        name: &str,
        service_type: &str,
    ) -> Result<&dyn GenerationProvider, GenerationError> {
        let provider = self
            .get(name)
            .ok_or_else(|| GenerationError::unsupported_provider_for(name, service_type))?;

        if !provider.is_configured() {
            return Err(GenerationError::provider_configuration(name));
        }

        Ok(provider)
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::provider::GeneratedMedia;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    /// A minimal stub provider used for testing.
    #[derive(Debug)]
    struct StubProvider {
        provider_name: &'static str,
        configured: bool,
    }

    #[async_trait]
    impl GenerationProvider for StubProvider {
        fn name(&self) -> &'static str {
            self.provider_name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate_image(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
            Ok(GeneratedMedia {
                bytes: b"stub".to_vec(),
                format: "png".to_string(),
            })
        }

        async fn generate_video(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
            Err(GenerationError::unsupported_provider_for(
                self.provider_name,
                "video",
            ))
        }
    }

    #[test]
    fn empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.get("openai").is_none());
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider {
            provider_name: "openai",
            configured: true,
        }));

        assert!(registry.get("openai").is_some());
        assert!(registry.get("nonexistent").is_none());
    }

    #[test]
    fn unknown_provider_is_unsupported() {
        let registry = ProviderRegistry::new();

        let err = registry.image_provider("midjourney").unwrap_err();
        assert_matches!(err, GenerationError::UnsupportedProvider { .. });
        assert_eq!(err.to_string(), "Unsupported image provider: midjourney");
        assert_eq!(err.code(), 400);

        let err = registry.video_provider("midjourney").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported video provider: midjourney");
    }

    #[test]
    fn unconfigured_provider_is_a_configuration_error() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider {
            provider_name: "openai",
            configured: false,
        }));

        let err = registry.image_provider("openai").unwrap_err();
        assert_matches!(err, GenerationError::ProviderConfiguration { .. });
        assert_eq!(
            err.to_string(),
            "Provider 'openai' is not configured or missing API key."
        );
        assert_eq!(err.code(), 500);
    }

    #[test]
    fn configured_provider_resolves() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(StubProvider {
            provider_name: "openai",
            configured: true,
        }));

        let provider = registry.image_provider("openai").unwrap();
        assert_eq!(provider.name(), "openai");
    }
}
