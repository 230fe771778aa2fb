//! Application configuration
//!
//! Loaded from `config.toml` under the platform config directory. Every
//! field has a default, so a missing or partial file is fine. The backend
//! endpoint can also be injected through `PARROT_ENDPOINT`, which takes
//! precedence over the file.

use crate::{ParrotError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable overriding the backend endpoint
pub const ENDPOINT_ENV_VAR: &str = "PARROT_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Backend endpoint receiving the multipart audio upload
    pub endpoint: String,
    /// BCP 47 tag selecting the text-to-speech voice
    pub language: String,
    /// Speech rate factor (1.0 = the voice's normal rate)
    pub speech_rate: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/process-audio/".to_string(),
            language: "fr-FR".to_string(),
            speech_rate: 0.5,
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("parrot")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load the configuration, falling back to defaults when the file is absent
pub fn load_config() -> Result<AppConfig> {
    let path = config_path();

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)?;
        toml::from_str(&content)
            .map_err(|e| ParrotError::ConfigError(format!("{}: {}", path.display(), e)))?
    } else {
        AppConfig::default()
    };

    if let Ok(endpoint) = std::env::var(ENDPOINT_ENV_VAR) {
        if !endpoint.trim().is_empty() {
            config.endpoint = endpoint;
        }
    }

    Ok(config)
}

/// Persist the configuration, creating the directory if needed
pub fn save_config(config: &AppConfig) -> Result<()> {
    let dir = config_dir();
    fs::create_dir_all(&dir)?;

    let content = toml::to_string_pretty(config)
        .map_err(|e| ParrotError::ConfigError(e.to_string()))?;
    fs::write(config_path(), content)?;

    Ok(())
}
