use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_MAX_FILE_SIZE, DocumentError};

/// Source format of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Pdf,
    Text,
    Csv,
}

impl FileType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Text => "text",
            Self::Csv => "csv",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw bytes of one uploaded file together with its original name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    #[must_use]
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Lowercased text after the last `.` of the filename, or the whole name if it has none.
    #[must_use]
    pub fn extension(&self) -> String {
        self.filename
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }

    /// Read a file from disk, keeping only its file name as `filename`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or exceeds the default size limit.
    pub async fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let meta = tokio::fs::metadata(path).await?;
        if meta.len() > DEFAULT_MAX_FILE_SIZE {
            return Err(DocumentError::FileTooLarge(meta.len()));
        }
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self { filename, bytes })
    }
}

/// Extracted text of one file. Never persisted, only its chunks are.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    pub filename: String,
    pub file_type: FileType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub filename: String,
    pub file_type: FileType,
    pub chunk_id: usize,
    /// Character offset of the window start in the normalized text.
    pub start_char: usize,
    /// Exclusive character offset of the window end in the normalized text.
    pub end_char: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub metadata: ChunkMetadata,
}
