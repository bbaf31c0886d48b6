use std::path::{Path, PathBuf};

use scrapyard_procgen::{ConfigError, GenConfig, WorldConfig};
use serde::{Deserialize, Serialize};

use crate::budget::StreamConfig;

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported config extension: {0:?} (expected .json, .yaml or .yml)")]
    UnknownFormat(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Everything needed to build a world and stream it, as one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapyardConfig {
    pub world: WorldConfig,
    pub generation: GenConfig,
    pub stream: StreamConfig,
}

impl ScrapyardConfig {
    /// Load from a `.json`, `.yaml` or `.yml` file and validate. Missing
    /// fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        let read = || {
            std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
                path: path.to_path_buf(),
                source,
            })
        };
        let config = match ext.as_deref() {
            Some("json") => Self::from_json_str(&read()?)?,
            Some("yaml" | "yml") => Self::from_yaml_str(&read()?)?,
            _ => return Err(ConfigLoadError::UnknownFormat(path.to_path_buf())),
        };
        tracing::debug!(?path, seed = config.world.seed, "config loaded");
        Ok(config)
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generation.validate(&self.world)?;
        self.stream.validate()
    }

    /// Pretty JSON with every field spelled out.
    pub fn to_json_pretty(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
