//! OpenAI image generation provider.
//!
//! Implements [`GenerationProvider`] against the OpenAI images API.
//! Responses are requested as base64 payloads and decoded in-process; a
//! request timeout is classified as a job timeout so the task queue can tell
//! a slow upstream from a broken one.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use stellar_common::GenerationError;

use crate::config::OpenAiConfig;
use crate::generation::provider::{GeneratedMedia, GenerationProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u8,
    size: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
}

/// OpenAI image provider.
#[derive(Debug)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    size: String,
    base_url: String,
}

impl OpenAiProvider {
    /// Create a new OpenAI provider from its config section.
    pub fn new(config: &OpenAiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            size: config.size.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        let url = format!("{}/images/generations", self.base_url);
        let request = ImageRequest {
            model: &self.model,
            prompt,
            n: 1,
            size: &self.size,
            response_format: "b64_json",
        };

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::job_timeout().with_source(e)
                } else {
                    GenerationError::api_request().with_source(e)
                }
            })?;

        let resp = resp.error_for_status().map_err(|e| {
            let code = e.status().map_or(502, |s| s.as_u16());
            GenerationError::api_request()
                .with_message(format!("OpenAI image request failed with status {code}"))
                .with_code(code)
                .with_source(e)
        })?;

        let body: ImageResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::image_generation().with_source(e))?;

        let b64 = body
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json)
            .ok_or_else(|| {
                GenerationError::image_generation()
                    .with_message("OpenAI response contained no image payload.")
            })?;

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(b64.as_bytes())
            .map_err(|e| GenerationError::image_generation().with_source(e))?;

        Ok(GeneratedMedia {
            bytes,
            format: "png".to_string(),
        })
    }

    async fn generate_video(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        Err(GenerationError::unsupported_provider_for(self.name(), "video"))
    }
}
