use super::types::{Chunk, ChunkMetadata, Document, FileType};

#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Sliding-window splitter over whitespace-normalized text.
///
/// Windows are `chunk_size` characters wide and advance by `chunk_size - chunk_overlap`.
/// A window that ends before the end of the text is pulled back to the last period
/// inside it, provided that period lies in the second half of the window.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
}

impl TextSplitter {
    #[must_use]
    pub fn new(config: SplitterConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.chunk(&document.content, &document.filename, document.file_type)
    }

    #[must_use]
    pub fn chunk(&self, text: &str, filename: &str, file_type: FileType) -> Vec<Chunk> {
        let normalized = normalize_whitespace(text);
        let chars: Vec<char> = normalized.chars().collect();
        let len = chars.len();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap;

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let mut end = start + size;
            if end < len
                && let Some(offset) = chars[start..end].iter().rposition(|&c| c == '.')
                && start + offset > start + size / 2
            {
                end = start + offset + 1;
            }
            let end = end.min(len);

            let window: String = chars[start..end].iter().collect();
            let trimmed = window.trim();
            if !trimmed.is_empty() {
                chunks.push(Chunk {
                    text: trimmed.to_owned(),
                    metadata: ChunkMetadata {
                        filename: filename.to_owned(),
                        file_type,
                        chunk_id: chunks.len(),
                        start_char: start,
                        end_char: end,
                    },
                });
            }

            if end >= len {
                break;
            }
            // Never step backwards, even when the overlap exceeds a snapped window.
            start = end.saturating_sub(overlap).max(start + 1);
        }

        chunks
    }
}

/// Collapse every whitespace run to a single space and trim both ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
