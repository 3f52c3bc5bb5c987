pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reader;
pub mod splitter;
pub mod types;

pub use error::DocumentError;
pub use loader::{CsvLoader, DocumentLoader, LoadFuture, TextLoader};
pub use pipeline::{FileOutcome, IngestionPipeline, PreparedBatch};
pub use reader::DocumentReader;
pub use splitter::{SplitterConfig, TextSplitter, normalize_whitespace};
pub use types::{Chunk, ChunkMetadata, Document, FileType, UploadedFile};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;
