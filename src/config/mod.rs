//! Configuration management for mnema
//!
//! TOML configuration with per-section defaults, environment overrides,
//! and validation at load time.

use crate::error::{MnemaError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the item database
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mnema");
        Self { data_dir }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name (e.g., "all-MiniLM-L6-v2")
    pub model: String,
    /// Embedding dimension; fixed for the lifetime of a corpus
    pub dimension: usize,
    /// Batch size for bulk embedding
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            dimension: 384,
            batch_size: 32,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Result limit when the caller does not pass one
    pub default_top_k: usize,
    /// Base similarity threshold for the semantic tier
    pub default_threshold: f32,
    /// Upper bound on the full-scan semantic pass; 0 disables the bound
    pub scan_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            default_threshold: 0.3,
            scan_timeout_ms: 2000,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MnemaError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| MnemaError::Io {
            source: e,
            context: format!("Failed to read config file: {:?}", path),
        })?;
        let mut config: Config = toml::from_str(&content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load the config at `path` if given, at the default path if one
    /// exists there, or fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::load(&default)
                } else {
                    let mut config = Config::default();
                    config.apply_env_overrides();
                    config.validate()?;
                    Ok(config)
                }
            }
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| MnemaError::Io {
                source: e,
                context: format!("Failed to create config directory: {:?}", parent),
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|e| MnemaError::Io {
            source: e,
            context: format!("Failed to write config file: {:?}", path),
        })?;
        Ok(())
    }

    /// Default config file path (~/.config/mnema/config.toml)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mnema")
            .join("config.toml")
    }

    /// Path of the item database under the configured data directory
    pub fn db_path(&self) -> PathBuf {
        self.storage.data_dir.join("mnema.db")
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("MNEMA_DATA_DIR") {
            if !dir.is_empty() {
                self.storage.data_dir = PathBuf::from(dir);
            }
        }

        if let Ok(model) = std::env::var("MNEMA_EMBEDDING_MODEL") {
            if !model.is_empty() {
                self.embedding.model = model;
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.embedding.model.is_empty() {
            return Err(MnemaError::InvalidConfigValue {
                path: "embedding.model".to_string(),
                message: "model name must not be empty".to_string(),
            });
        }

        if self.embedding.dimension == 0 {
            return Err(MnemaError::InvalidConfigValue {
                path: "embedding.dimension".to_string(),
                message: "dimension must be positive".to_string(),
            });
        }

        if self.embedding.batch_size == 0 {
            return Err(MnemaError::InvalidConfigValue {
                path: "embedding.batch_size".to_string(),
                message: "batch size must be positive".to_string(),
            });
        }

        if self.search.default_top_k == 0 {
            return Err(MnemaError::InvalidConfigValue {
                path: "search.default_top_k".to_string(),
                message: "default top_k must be positive".to_string(),
            });
        }

        if !(-1.0..=1.0).contains(&self.search.default_threshold) {
            return Err(MnemaError::InvalidConfigValue {
                path: "search.default_threshold".to_string(),
                message: "threshold must be within [-1, 1]".to_string(),
            });
        }

        Ok(())
    }
}
