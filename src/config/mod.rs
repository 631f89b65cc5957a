mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./stellar.toml",
        "~/.config/stellar/config.toml",
        "/etc/stellar/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.providers.openai.enabled && config.providers.openai.api_key.is_empty() {
        anyhow::bail!("Provider 'openai' is enabled but has no API key");
    }

    if config.providers.replicate.enabled && config.providers.replicate.api_token.is_empty() {
        anyhow::bail!("Provider 'replicate' is enabled but has no API token");
    }

    if config.queue.generation_attempts == 0 || config.queue.audit_attempts == 0 {
        anyhow::bail!("Queue retry attempts must be at least 1");
    }

    Ok(())
}
