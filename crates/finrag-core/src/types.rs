use std::collections::BTreeSet;

use finrag_memory::document::{Chunk, ChunkMetadata, FileOutcome};
use finrag_memory::{Payload, ScoredVectorPoint, VectorStoreError};
use serde::{Deserialize, Serialize};

/// Payload field names of an indexed chunk.
pub(crate) mod fields {
    pub const FILENAME: &str = "filename";
    pub const FILE_TYPE: &str = "file_type";
}

/// Stats value for a record with no filename or file type.
pub const UNKNOWN: &str = "unknown";

/// On-index shape of a chunk: the text plus its flattened metadata.
#[derive(Debug, Serialize, Deserialize)]
struct ChunkPayload {
    text: String,
    #[serde(flatten)]
    metadata: ChunkMetadata,
}

pub(crate) fn chunk_payload(chunk: Chunk) -> Result<Payload, VectorStoreError> {
    let value = serde_json::to_value(ChunkPayload {
        text: chunk.text,
        metadata: chunk.metadata,
    })
    .map_err(|e| VectorStoreError::Serialization(e.to_string()))?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(VectorStoreError::Serialization(format!(
            "chunk payload is not an object: {other}"
        ))),
    }
}

/// One search hit, ranked by ascending cosine distance.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMetadata,
    /// Cosine distance, in `[0, 2]`.
    pub distance: f32,
    /// Always `1 - distance`.
    pub similarity: f32,
}

impl TryFrom<ScoredVectorPoint> for RetrievedChunk {
    type Error = VectorStoreError;

    fn try_from(point: ScoredVectorPoint) -> Result<Self, Self::Error> {
        let ChunkPayload { text, metadata } =
            serde_json::from_value(serde_json::Value::Object(point.payload.into_iter().collect()))
                .map_err(|e| {
                    VectorStoreError::Serialization(format!("point {}: {e}", point.id))
                })?;
        let distance = 1.0 - point.score;
        Ok(Self {
            id: point.id,
            text,
            metadata,
            distance,
            similarity: 1.0 - distance,
        })
    }
}

/// Completion result. `failure` is set when `text` is the fallback message.
#[derive(Debug)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievedChunk>,
    pub failure: Option<crate::RagError>,
}

impl Answer {
    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.failure.is_some()
    }
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub chunks_added: usize,
    pub files: Vec<FileOutcome>,
}

impl IngestReport {
    #[must_use]
    pub fn failed_files(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.is_ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub total_chunks: usize,
    pub unique_files: usize,
    pub file_types: BTreeSet<String>,
}

impl IndexStats {
    pub(crate) fn from_payloads(payloads: &[Payload]) -> Self {
        let field = |p: &Payload, key: &str| {
            p.get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or(UNKNOWN)
                .to_owned()
        };
        let files: BTreeSet<String> = payloads.iter().map(|p| field(p, fields::FILENAME)).collect();
        let file_types = payloads.iter().map(|p| field(p, fields::FILE_TYPE)).collect();
        Self {
            total_chunks: payloads.len(),
            unique_files: files.len(),
            file_types,
        }
    }
}
