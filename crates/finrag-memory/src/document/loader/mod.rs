mod csv;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use self::csv::CsvLoader;
#[cfg(feature = "pdf")]
pub use self::pdf::PdfLoader;
pub use self::text::TextLoader;

use std::future::Future;
use std::pin::Pin;

use super::{Document, DocumentError, FileType, UploadedFile};

pub type LoadFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Document, DocumentError>> + Send + 'a>>;

/// Format-specific text extraction from an uploaded file's bytes.
pub trait DocumentLoader: Send + Sync {
    /// Resolves to an error if the bytes cannot be decoded or parsed for this format.
    fn load<'a>(&'a self, file: &'a UploadedFile) -> LoadFuture<'a>;

    fn file_type(&self) -> FileType;

    fn supported_extensions(&self) -> &[&str];
}
