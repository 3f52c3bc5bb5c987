use std::path::PathBuf;

use finrag_llm::LlmError;
use finrag_memory::VectorStoreError;

/// Startup configuration failures. All of them are fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENAI_API_KEY is not set")]
    MissingApiKey,

    #[error("OPENAI_API_KEY still holds the placeholder value")]
    PlaceholderApiKey,

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("vault error: {0}")]
    Vault(#[from] anyhow::Error),
}

/// Failures surfaced by [`crate::engine::RagEngine`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("embedding failed: {0}")]
    Embedding(#[source] LlmError),

    #[error("completion failed: {0}")]
    Completion(#[source] LlmError),

    #[error("vector index error: {0}")]
    Index(#[from] VectorStoreError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, RagError>;
