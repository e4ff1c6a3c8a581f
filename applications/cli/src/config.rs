/// Application configuration
use reprise_engine::EngineConfig;
use reprise_playback::types::{CoordinatorConfig, MAX_VOLUME, MIN_VOLUME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub playback: CoordinatorConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://reprise.db".to_string()
}

impl AppConfig {
    /// Load from `path` (or `reprise.toml` when present) and `REPRISE_*`
    /// environment variables, e.g. `REPRISE_PLAYBACK__VOLUME=0.8`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut settings = config::Config::builder();

        let config_path = path.map_or_else(|| PathBuf::from("reprise.toml"), Path::to_path_buf);
        let explicit = path.is_some();
        settings = settings.add_source(config::File::from(config_path).required(explicit));

        settings = settings.add_source(
            config::Environment::with_prefix("REPRISE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.sampling_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "engine.sampling_interval_ms must be greater than 0".to_string(),
            ));
        }

        let volume = self.playback.volume;
        if !(MIN_VOLUME..=MAX_VOLUME).contains(&volume) {
            return Err(ConfigError::Invalid(format!(
                "playback.volume must be within [{MIN_VOLUME}, {MAX_VOLUME}], got {volume}"
            )));
        }

        if self.storage.database_url.is_empty() {
            return Err(ConfigError::Invalid(
                "storage.database_url is required".to_string(),
            ));
        }

        Ok(())
    }
}
