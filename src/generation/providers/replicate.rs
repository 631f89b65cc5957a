//! Replicate video generation provider.
//!
//! Implements [`GenerationProvider`] against the Replicate predictions API:
//! create a prediction, poll until it reaches a terminal status, then
//! download the output. Polling is bounded by a configurable window; an
//! expired window is classified as a job timeout.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stellar_common::GenerationError;
use tokio::time::Instant;

use crate::config::ReplicateConfig;
use crate::generation::provider::{GeneratedMedia, GenerationProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    output: Option<serde_json::Value>,
    error: Option<String>,
}

/// Replicate video provider.
#[derive(Debug)]
pub struct ReplicateProvider {
    client: reqwest::Client,
    api_token: String,
    version: String,
    base_url: String,
    poll_interval: Duration,
    poll_timeout: Duration,
}

impl ReplicateProvider {
    /// Create a new Replicate provider from its config section.
    pub fn new(config: &ReplicateConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");

        Self {
            client,
            api_token: config.api_token.clone(),
            version: config.version.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            poll_timeout: Duration::from_secs(config.poll_timeout_secs),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Prediction, GenerationError> {
        let resp = self
            .client
            .get(url)
            .header("Authorization", format!("Token {}", self.api_token))
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
                .with_message(format!("Replicate request failed with status {code}"))
                .with_code(code)
                .with_source(e)
        })?;

        resp.json()
            .await
            .map_err(|e| GenerationError::video_generation().with_source(e))
    }
}

#[async_trait]
impl GenerationProvider for ReplicateProvider {
    fn name(&self) -> &'static str {
        "replicate"
    }

    fn is_configured(&self) -> bool {
        !self.api_token.is_empty() && !self.version.is_empty()
    }

    async fn generate_image(&self, _prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        Err(GenerationError::unsupported_provider_for(self.name(), "image"))
    }

    async fn generate_video(&self, prompt: &str) -> Result<GeneratedMedia, GenerationError> {
        let url = format!("{}/predictions", self.base_url);
        let request = PredictionRequest {
            version: &self.version,
            input: PredictionInput { prompt },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
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
                .with_message(format!("Replicate request failed with status {code}"))
                .with_code(code)
                .with_source(e)
        })?;

        let mut prediction: Prediction = resp
            .json()
            .await
            .map_err(|e| GenerationError::video_generation().with_source(e))?;

        let deadline = Instant::now() + self.poll_timeout;
        loop {
            match prediction.status.as_str() {
                "succeeded" => break,
                "failed" | "canceled" => {
                    let reason = prediction
                        .error
                        .unwrap_or_else(|| "no failure detail".to_string());
                    return Err(GenerationError::video_generation()
                        .with_message(format!("Replicate prediction failed: {reason}")));
                }
                _ => {}
            }

            if Instant::now() >= deadline {
                return Err(GenerationError::job_timeout().with_message(format!(
                    "Replicate prediction {} did not finish within {}s",
                    prediction.id,
                    self.poll_timeout.as_secs()
                )));
            }

            tokio::time::sleep(self.poll_interval).await;
            let poll_url = format!("{}/predictions/{}", self.base_url, prediction.id);
            prediction = self.get_json(&poll_url).await?;
        }

        let output_url = first_output_url(prediction.output.as_ref()).ok_or_else(|| {
            GenerationError::video_generation()
                .with_message("Replicate prediction returned no output.")
        })?;

        let bytes = self
            .client
            .get(output_url)
            .send()
            .await
            .map_err(|e| GenerationError::api_request().with_source(e))?
            .error_for_status()
            .map_err(|e| GenerationError::api_request().with_source(e))?
            .bytes()
            .await
            .map_err(|e| GenerationError::video_generation().with_source(e))?;

        Ok(GeneratedMedia {
            bytes: bytes.to_vec(),
            format: "mp4".to_string(),
        })
    }
}

/// Extract the first output URL from a prediction's `output` field, which
/// Replicate returns either as a single URL string or a list of them.
fn first_output_url(output: Option<&serde_json::Value>) -> Option<&str> {
    match output? {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Array(items) => items.iter().find_map(|v| v.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_configured_requires_token_and_version() {
        let provider = ReplicateProvider::new(&ReplicateConfig::default());
        assert!(!provider.is_configured());

        let provider = ReplicateProvider::new(&ReplicateConfig {
            api_token: "r8-test".to_string(),
            ..ReplicateConfig::default()
        });
        assert!(!provider.is_configured());

        let provider = ReplicateProvider::new(&ReplicateConfig {
            api_token: "r8-test".to_string(),
            version: "abc123".to_string(),
            ..ReplicateConfig::default()
        });
        assert!(provider.is_configured());
    }

    #[tokio::test]
    async fn test_image_is_unsupported() {
        let provider = ReplicateProvider::new(&ReplicateConfig::default());
        let err = provider.generate_image("a red dwarf star").await.unwrap_err();
        assert_matches!(err, GenerationError::UnsupportedProvider { .. });
        assert_eq!(err.to_string(), "Unsupported image provider: replicate");
    }

    #[test]
    fn test_first_output_url() {
        let single = serde_json::json!("https://cdn.example/video.mp4");
        assert_eq!(
            first_output_url(Some(&single)),
            Some("https://cdn.example/video.mp4")
        );

        let list = serde_json::json!(["https://cdn.example/a.mp4", "https://cdn.example/b.mp4"]);
        assert_eq!(
            first_output_url(Some(&list)),
            Some("https://cdn.example/a.mp4")
        );

        let empty = serde_json::json!([]);
        assert_eq!(first_output_url(Some(&empty)), None);
        assert_eq!(first_output_url(Some(&serde_json::json!(42))), None);
        assert_eq!(first_output_url(None), None);
    }
}
