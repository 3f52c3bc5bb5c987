use std::fmt::Write as _;

use super::{Document, DocumentError, DocumentLoader, FileType, LoadFuture, UploadedFile};

/// Per-page PDF text extraction. Each page is preceded by a `--- Page N ---` marker.
#[derive(Debug, Default)]
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load<'a>(&'a self, file: &'a UploadedFile) -> LoadFuture<'a> {
        Box::pin(async move {
            let bytes = file.bytes.clone();
            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem_by_pages(&bytes)
                    .map_err(|e| DocumentError::Pdf(e.to_string()))
            })
            .await
            .map_err(|e| DocumentError::Pdf(format!("extraction task failed: {e}")))??;

            tracing::debug!(filename = %file.filename, pages = pages.len(), "extracted PDF text");

            Ok(Document {
                content: join_pages(&pages),
                filename: file.filename.clone(),
                file_type: FileType::Pdf,
            })
        })
    }

    fn file_type(&self) -> FileType {
        FileType::Pdf
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

fn join_pages(pages: &[String]) -> String {
    let mut out = String::new();
    for (i, page) in pages.iter().enumerate() {
        let _ = write!(out, "\n--- Page {} ---\n", i + 1);
        out.push_str(page);
    }
    out
}
