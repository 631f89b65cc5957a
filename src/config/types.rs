use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub queue: QueueConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./stellar.db")
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Base directory for generated media artifacts.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("./media")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            media_dir: default_media_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Registry name of the provider serving image generation.
    #[serde(default = "default_image_provider")]
    pub image_provider: String,

    /// Registry name of the provider serving video generation.
    #[serde(default = "default_video_provider")]
    pub video_provider: String,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub replicate: ReplicateConfig,
}

fn default_image_provider() -> String {
    "openai".to_string()
}

fn default_video_provider() -> String {
    "replicate".to_string()
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            image_provider: default_image_provider(),
            video_provider: default_video_provider(),
            openai: OpenAiConfig::default(),
            replicate: ReplicateConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_key: String,

    /// Image model to request.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// Image dimensions, e.g. "1024x1024".
    #[serde(default = "default_image_size")]
    pub size: String,

    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

fn default_openai_model() -> String {
    "gpt-image-1".to_string()
}

fn default_image_size() -> String {
    "1024x1024".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
            model: default_openai_model(),
            size: default_image_size(),
            base_url: default_openai_base_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicateConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub api_token: String,

    /// Model version hash to run.
    #[serde(default)]
    pub version: String,

    #[serde(default = "default_replicate_base_url")]
    pub base_url: String,

    /// Seconds between prediction status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Total seconds to wait for a prediction before timing out.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_replicate_base_url() -> String {
    "https://api.replicate.com/v1".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

fn default_poll_timeout() -> u64 {
    300
}

impl Default for ReplicateConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_token: String::new(),
            version: String::new(),
            base_url: default_replicate_base_url(),
            poll_interval_secs: default_poll_interval(),
            poll_timeout_secs: default_poll_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Attempts per generation task before dead-lettering.
    #[serde(default = "default_generation_attempts")]
    pub generation_attempts: u32,

    /// Fixed delay between generation attempts, in seconds.
    #[serde(default = "default_generation_retry_delay")]
    pub generation_retry_delay_secs: u64,

    /// Attempts per audit task before dead-lettering.
    #[serde(default = "default_audit_attempts")]
    pub audit_attempts: u32,

    /// Fixed delay between audit attempts, in seconds.
    #[serde(default = "default_audit_retry_delay")]
    pub audit_retry_delay_secs: u64,
}

fn default_generation_attempts() -> u32 {
    3
}

fn default_generation_retry_delay() -> u64 {
    30
}

fn default_audit_attempts() -> u32 {
    3
}

fn default_audit_retry_delay() -> u64 {
    10
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            generation_attempts: default_generation_attempts(),
            generation_retry_delay_secs: default_generation_retry_delay(),
            audit_attempts: default_audit_attempts(),
            audit_retry_delay_secs: default_audit_retry_delay(),
        }
    }
}
