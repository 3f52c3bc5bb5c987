use finrag_llm::{ChatOptions, LlmError, LlmProvider};
use finrag_memory::document::{IngestionPipeline, UploadedFile};
use finrag_memory::{VectorPoint, VectorStore};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{RagError, Result};
use crate::prompt::{FALLBACK_ANSWER, build_messages};
use crate::types::{Answer, IndexStats, IngestReport, RetrievedChunk, chunk_payload};

/// Used only for an unvalidated [`Config`] whose embedding model has no known dimension.
const DEFAULT_VECTOR_SIZE: u64 = 1536;

/// Per-engine knobs, usually taken from [`Config`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub collection: String,
    pub vector_size: u64,
    pub top_k: usize,
    pub chat_options: ChatOptions,
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            collection: config.index.collection.clone(),
            vector_size: config.vector_size().unwrap_or(DEFAULT_VECTOR_SIZE),
            top_k: config.retrieval.top_k,
            chat_options: config.chat_options(),
        }
    }
}

/// Ingest, search and answer over one vector collection.
///
/// Holds no state of its own besides the vector store; every operation runs to completion.
pub struct RagEngine<P: LlmProvider> {
    provider: P,
    store: Box<dyn VectorStore>,
    pipeline: IngestionPipeline,
    settings: EngineSettings,
}

impl<P: LlmProvider> std::fmt::Debug for RagEngine<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagEngine")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<P: LlmProvider> RagEngine<P> {
    #[must_use]
    pub fn new(
        provider: P,
        store: Box<dyn VectorStore>,
        pipeline: IngestionPipeline,
        settings: EngineSettings,
    ) -> Self {
        Self {
            provider,
            store,
            pipeline,
            settings,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get-or-create the collection. Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if the store cannot create the collection.
    pub async fn init(&self) -> Result<()> {
        self.store
            .ensure_collection(&self.settings.collection, self.settings.vector_size)
            .await?;
        Ok(())
    }

    /// Read, chunk, embed and index a batch of uploads.
    ///
    /// Files that fail to read are reported in [`IngestReport::files`] and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the batch cannot be embedded (nothing is
    /// written) or [`RagError::Index`] if the upsert fails.
    pub async fn ingest(&self, files: &[UploadedFile]) -> Result<IngestReport> {
        let batch = self.pipeline.prepare(files).await;
        if batch.chunks.is_empty() {
            tracing::info!(files = files.len(), "no chunks to index");
            return Ok(IngestReport {
                chunks_added: 0,
                files: batch.outcomes,
            });
        }

        let texts: Vec<String> = batch.chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .provider
            .embed_batch(&texts)
            .await
            .map_err(RagError::Embedding)?;
        if vectors.len() != texts.len() {
            return Err(RagError::Embedding(LlmError::EmbeddingCount {
                expected: texts.len(),
                actual: vectors.len(),
            }));
        }

        let failed = batch.failed();
        let points = batch
            .chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| -> Result<VectorPoint> {
                Ok(VectorPoint {
                    id: Uuid::new_v4().to_string(),
                    vector,
                    payload: chunk_payload(chunk)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let chunks_added = points.len();
        self.store
            .upsert(&self.settings.collection, points)
            .await?;

        tracing::info!(
            chunks = chunks_added,
            files = batch.outcomes.len(),
            failed,
            "indexed documents"
        );
        Ok(IngestReport {
            chunks_added,
            files: batch.outcomes,
        })
    }

    /// Top `k` chunks for `query`, ordered by ascending cosine distance.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Embedding`] if the query cannot be embedded or
    /// [`RagError::Index`] if the store query fails.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievedChunk>> {
        let vector = self
            .provider
            .embed_batch(&[query.to_owned()])
            .await
            .map_err(RagError::Embedding)?
            .into_iter()
            .next()
            .ok_or(RagError::Embedding(LlmError::EmbeddingCount {
                expected: 1,
                actual: 0,
            }))?;

        let points = self
            .store
            .search(&self.settings.collection, vector, k as u64)
            .await?;

        let mut hits = points
            .into_iter()
            .map(RetrievedChunk::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));

        tracing::debug!(k, hits = hits.len(), "retrieved chunks");
        Ok(hits)
    }

    /// Answer `query` from the top `top_k` chunks.
    ///
    /// Embedding and completion failures do not error: the returned [`Answer`] carries
    /// the fallback text and the failure.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if retrieval fails in the vector store.
    pub async fn answer(&self, query: &str) -> Result<Answer> {
        let sources = match self.search(query, self.settings.top_k).await {
            Ok(sources) => sources,
            Err(e @ RagError::Embedding(_)) => return Ok(fallback(Vec::new(), e)),
            Err(e) => return Err(e),
        };

        let messages = build_messages(query, &sources);
        match self
            .provider
            .chat(&messages, self.settings.chat_options)
            .await
        {
            Ok(text) => Ok(Answer {
                text,
                sources,
                failure: None,
            }),
            Err(e) => Ok(fallback(sources, RagError::Completion(e))),
        }
    }

    /// # Errors
    ///
    /// Returns [`RagError::Index`] if the collection cannot be scanned.
    pub async fn stats(&self) -> Result<IndexStats> {
        let payloads = self
            .store
            .scroll_payloads(&self.settings.collection)
            .await?;
        Ok(IndexStats::from_payloads(&payloads))
    }

    /// Drop every indexed chunk by deleting and recreating the collection.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Index`] if either step fails.
    pub async fn clear(&self) -> Result<()> {
        self.store
            .delete_collection(&self.settings.collection)
            .await?;
        self.init().await?;
        tracing::info!(collection = %self.settings.collection, "cleared collection");
        Ok(())
    }
}

fn fallback(sources: Vec<RetrievedChunk>, failure: RagError) -> Answer {
    tracing::error!("answer failed: {failure}");
    Answer {
        text: FALLBACK_ANSWER.to_owned(),
        sources,
        failure: Some(failure),
    }
}
