//! Application context built once at startup.

use std::path::{Path, PathBuf};

use finrag_llm::http::client_with_timeouts;
use finrag_llm::openai::OpenAiProvider;
use finrag_memory::document::{DocumentReader, IngestionPipeline, TextSplitter};
use finrag_memory::{LocalVectorStore, QdrantOps, VectorStore, VectorStoreError};

use crate::config::{Config, IndexBackend};
use crate::engine::{EngineSettings, RagEngine};
use crate::error::{ConfigError, RagError};
use crate::vault::VaultProvider;

pub const DEFAULT_CONFIG_PATH: &str = "config/finrag.toml";

/// Priority: `--config` flag > `FINRAG_CONFIG` env > `config/finrag.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("FINRAG_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from(DEFAULT_CONFIG_PATH)
}

/// Validated configuration plus the engine wired from it.
#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub engine: RagEngine<OpenAiProvider>,
}

impl AppContext {
    /// Load the config file, resolve secrets, validate, then connect the index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] for any configuration problem or
    /// [`RagError::Index`] if the vector index cannot be opened.
    pub async fn build(config_path: &Path, vault: &dyn VaultProvider) -> Result<Self, RagError> {
        let mut config = Config::load(config_path)?;
        config.resolve_secrets(vault).await?;
        Self::from_config(config).await
    }

    /// # Errors
    ///
    /// See [`AppContext::build`].
    pub async fn from_config(config: Config) -> Result<Self, RagError> {
        config.validate()?;

        let api_key = config
            .secrets
            .openai_api_key
            .as_ref()
            .ok_or(ConfigError::MissingApiKey)?
            .expose()
            .to_owned();
        let client = client_with_timeouts(config.connect_timeout(), config.request_timeout())
            .map_err(|e| ConfigError::Invalid(format!("HTTP client: {e}")))?;
        let provider = OpenAiProvider::new(
            api_key,
            config.llm.base_url.clone(),
            config.llm.chat_model.clone(),
            config.llm.embedding_model.clone(),
        )
        .with_client(client);

        let store = open_store(&config).await?;
        let pipeline = IngestionPipeline::new(
            DocumentReader::default(),
            TextSplitter::new(config.splitter_config()),
        );
        let engine = RagEngine::new(provider, store, pipeline, EngineSettings::from(&config));
        engine.init().await?;

        tracing::info!(
            backend = ?config.index.backend,
            collection = %config.index.collection,
            chat_model = %config.llm.chat_model,
            embedding_model = %config.llm.embedding_model,
            "finrag ready"
        );
        Ok(Self { config, engine })
    }
}

async fn open_store(config: &Config) -> Result<Box<dyn VectorStore>, RagError> {
    match config.index.backend {
        IndexBackend::Local => {
            let store = LocalVectorStore::open(&config.index.path).await?;
            Ok(Box::new(store))
        }
        IndexBackend::Qdrant => {
            let ops = QdrantOps::new(&config.index.qdrant_url)
                .map_err(|e| VectorStoreError::Connection(e.to_string()))?;
            Ok(Box::new(ops))
        }
    }
}
