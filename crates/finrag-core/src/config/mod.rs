mod env;
mod types;


pub use types::*;

use std::path::Path;
use std::time::Duration;

use finrag_llm::ChatOptions;
use finrag_llm::openai::embedding_dimensions;
use finrag_memory::document::SplitterConfig;

use crate::error::ConfigError;
use crate::vault::{Secret, VaultProvider};

/// Value shipped in `.env.example`; treated as "not configured".
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve the API key through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> Result<(), ConfigError> {
        if let Some(val) = vault.get_secret("OPENAI_API_KEY").await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first problem found: a missing or placeholder API key, or an
    /// out-of-range numeric setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.secrets.openai_api_key.as_ref().map(|s| s.expose().trim()) {
            None | Some("") => return Err(ConfigError::MissingApiKey),
            Some(PLACEHOLDER_API_KEY) => return Err(ConfigError::PlaceholderApiKey),
            Some(_) => {}
        }

        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid("retrieval.top_k must be > 0".into()));
        }
        match self.vector_size() {
            None => {
                return Err(ConfigError::Invalid(format!(
                    "index.vector_size must be set for embedding model {}",
                    self.llm.embedding_model
                )));
            }
            Some(0) => return Err(ConfigError::Invalid("index.vector_size must be > 0".into())),
            Some(_) => {}
        }
        if self.index.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("index.collection must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature ({}) must be within [0, 2]",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid("llm.max_tokens must be > 0".into()));
        }
        if self.timeouts.connect_secs == 0 || self.timeouts.request_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be > 0".into()));
        }
        Ok(())
    }

    /// Explicit `index.vector_size`, else the known dimension of `llm.embedding_model`.
    #[must_use]
    pub fn vector_size(&self) -> Option<u64> {
        self.index
            .vector_size
            .or_else(|| embedding_dimensions(&self.llm.embedding_model))
    }

    #[must_use]
    pub fn splitter_config(&self) -> SplitterConfig {
        SplitterConfig {
            chunk_size: self.chunking.chunk_size,
            chunk_overlap: self.chunking.chunk_overlap,
        }
    }

    #[must_use]
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            temperature: self.llm.temperature,
            max_tokens: self.llm.max_tokens,
        }
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.connect_secs)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeouts.request_secs)
    }
}
