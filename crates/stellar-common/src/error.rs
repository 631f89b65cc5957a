//! The typed failure taxonomy for the generation pipeline.
//!
//! Every failure the pipeline can raise is one of the eight variants of
//! [`GenerationError`]. Each variant carries a human-readable message, a
//! numeric classification code, and an optional wrapped cause. Constructors
//! yield documented defaults; `with_message`, `with_code`, and `with_source`
//! override the fields independently.

/// Boxed underlying cause attached to an error variant.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Typed failure raised by the generation pipeline.
///
/// The set is closed: callers match exhaustively and new failure kinds are a
/// breaking change. The `Display` impl renders only the message; the code is
/// exposed via [`code`](Self::code) and the cause via
/// [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// An upstream HTTP/API call failed.
    #[error("{message}")]
    ApiRequest {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// An email verification step failed.
    #[error("{message}")]
    EmailVerification {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// An image generation call produced no usable artifact.
    #[error("{message}")]
    ImageGeneration {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A generation job exceeded its deadline.
    #[error("{message}")]
    JobTimeout {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A provider is known but not usable (missing key, bad setup).
    #[error("{message}")]
    ProviderConfiguration {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A filesystem or database operation failed.
    #[error("{message}")]
    Storage {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// The requested provider/service combination is not implemented.
    #[error("{message}")]
    UnsupportedProvider {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },

    /// A video generation call produced no usable artifact.
    #[error("{message}")]
    VideoGeneration {
        message: String,
        code: u16,
        #[source]
        source: Option<BoxedCause>,
    },
}

impl GenerationError {
    /// Upstream API call failure (code 502).
    pub fn api_request() -> Self {
        Self::ApiRequest {
            message: "API request failed.".to_string(),
            code: 502,
            source: None,
        }
    }

    /// Email verification failure (code 400).
    pub fn email_verification() -> Self {
        Self::EmailVerification {
            message: "Email verification failed.".to_string(),
            code: 400,
            source: None,
        }
    }

    /// Image generation failure (code 500).
    pub fn image_generation() -> Self {
        Self::ImageGeneration {
            message: "Image generation failed.".to_string(),
            code: 500,
            source: None,
        }
    }

    /// Job deadline exceeded (code 504).
    pub fn job_timeout() -> Self {
        Self::JobTimeout {
            message: "Job timed out.".to_string(),
            code: 504,
            source: None,
        }
    }

    /// Provider misconfiguration (code 500). The message names the provider.
    pub fn provider_configuration(provider: &str) -> Self {
        Self::ProviderConfiguration {
            message: format!("Provider '{provider}' is not configured or missing API key."),
            code: 500,
            source: None,
        }
    }

    /// Storage failure (code 500).
    pub fn storage() -> Self {
        Self::Storage {
            message: "Storage operation failed.".to_string(),
            code: 500,
            source: None,
        }
    }

    /// Unsupported provider for a generic service (code 400).
    pub fn unsupported_provider(provider: &str) -> Self {
        Self::unsupported_provider_for(provider, "service")
    }

    /// Unsupported provider for a named service such as `"image"` or
    /// `"video"` (code 400). The message is always synthesized from the two
    /// labels.
    pub fn unsupported_provider_for(provider: &str, service_type: &str) -> Self {
        Self::UnsupportedProvider {
            message: format!("Unsupported {service_type} provider: {provider}"),
            code: 400,
            source: None,
        }
    }

    /// Video generation failure (code 500).
    pub fn video_generation() -> Self {
        Self::VideoGeneration {
            message: "Video generation failed.".to_string(),
            code: 500,
            source: None,
        }
    }

    /// Replace the message, keeping code and cause.
    #[must_use]
    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        *self.message_mut() = message.into();
        self
    }

    /// Replace the classification code, keeping message and cause.
    #[must_use]
    pub fn with_code(mut self, code: u16) -> Self {
        *self.code_mut() = code;
        self
    }

    /// Attach an underlying cause, preserved verbatim for introspection.
    #[must_use]
    pub fn with_source<E: Into<BoxedCause>>(mut self, source: E) -> Self {
        *self.source_mut() = Some(source.into());
        self
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        match self {
            Self::ApiRequest { message, .. }
            | Self::EmailVerification { message, .. }
            | Self::ImageGeneration { message, .. }
            | Self::JobTimeout { message, .. }
            | Self::ProviderConfiguration { message, .. }
            | Self::Storage { message, .. }
            | Self::UnsupportedProvider { message, .. }
            | Self::VideoGeneration { message, .. } => message,
        }
    }

    /// The numeric classification code.
    pub fn code(&self) -> u16 {
        match self {
            Self::ApiRequest { code, .. }
            | Self::EmailVerification { code, .. }
            | Self::ImageGeneration { code, .. }
            | Self::JobTimeout { code, .. }
            | Self::ProviderConfiguration { code, .. }
            | Self::Storage { code, .. }
            | Self::UnsupportedProvider { code, .. }
            | Self::VideoGeneration { code, .. } => *code,
        }
    }

    fn message_mut(&mut self) -> &mut String {
        match self {
            Self::ApiRequest { message, .. }
            | Self::EmailVerification { message, .. }
            | Self::ImageGeneration { message, .. }
            | Self::JobTimeout { message, .. }
            | Self::ProviderConfiguration { message, .. }
            | Self::Storage { message, .. }
            | Self::UnsupportedProvider { message, .. }
            | Self::VideoGeneration { message, .. } => message,
        }
    }

    fn code_mut(&mut self) -> &mut u16 {
        match self {
            Self::ApiRequest { code, .. }
            | Self::EmailVerification { code, .. }
            | Self::ImageGeneration { code, .. }
            | Self::JobTimeout { code, .. }
            | Self::ProviderConfiguration { code, .. }
            | Self::Storage { code, .. }
            | Self::UnsupportedProvider { code, .. }
            | Self::VideoGeneration { code, .. } => code,
        }
    }

    fn source_mut(&mut self) -> &mut Option<BoxedCause> {
        match self {
            Self::ApiRequest { source, .. }
            | Self::EmailVerification { source, .. }
            | Self::ImageGeneration { source, .. }
            | Self::JobTimeout { source, .. }
            | Self::ProviderConfiguration { source, .. }
            | Self::Storage { source, .. }
            | Self::UnsupportedProvider { source, .. }
            | Self::VideoGeneration { source, .. } => source,
        }
    }
}
