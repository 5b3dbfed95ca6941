use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::ingest::IngestError;
use crate::search::SearchError;
use crate::store::StoreError;

/// Main error type for the mnema application
#[derive(Error, Debug)]
pub enum MnemaError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// Item store errors
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Embedding provider errors
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    /// Ingestion errors
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Search errors
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Knowledge item not found
    #[error("Knowledge item not found: {id}")]
    ItemNotFound { id: i64 },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type for mnema operations
pub type Result<T> = std::result::Result<T, MnemaError>;
