use super::{Chunk, DocumentError, DocumentReader, TextSplitter, UploadedFile};

/// Result of reading and splitting one uploaded file.
#[derive(Debug)]
pub struct FileOutcome {
    pub filename: String,
    /// Number of chunks produced, or the error that stopped this file.
    pub outcome: Result<usize, DocumentError>,
}

impl FileOutcome {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Chunks accumulated across a batch, ready to be embedded.
#[derive(Debug, Default)]
pub struct PreparedBatch {
    pub chunks: Vec<Chunk>,
    pub outcomes: Vec<FileOutcome>,
}

impl PreparedBatch {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.is_ok()).count()
    }
}

/// Read -> split for a batch of uploads. A failing file is recorded and skipped.
#[derive(Debug)]
pub struct IngestionPipeline {
    reader: DocumentReader,
    splitter: TextSplitter,
}

impl IngestionPipeline {
    #[must_use]
    pub fn new(reader: DocumentReader, splitter: TextSplitter) -> Self {
        Self { reader, splitter }
    }

    pub async fn prepare(&self, files: &[UploadedFile]) -> PreparedBatch {
        let mut batch = PreparedBatch::default();

        for file in files {
            let outcome = match self.reader.read(file).await {
                Ok(document) => {
                    let chunks = self.splitter.split(&document);
                    let count = chunks.len();
                    tracing::debug!(filename = %file.filename, chunks = count, "document split");
                    batch.chunks.extend(chunks);
                    Ok(count)
                }
                Err(e) => {
                    tracing::warn!(filename = %file.filename, "skipping file: {e}");
                    Err(e)
                }
            };
            batch.outcomes.push(FileOutcome {
                filename: file.filename.clone(),
                outcome,
            });
        }

        batch
    }
}
