use super::{
    CsvLoader, DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, TextLoader,
    UploadedFile,
};

/// Dispatches an uploaded file to the loader registered for its extension.
pub struct DocumentReader {
    loaders: Vec<Box<dyn DocumentLoader>>,
    pub max_file_size: u64,
}

impl Default for DocumentReader {
    fn default() -> Self {
        let mut loaders: Vec<Box<dyn DocumentLoader>> =
            vec![Box::new(TextLoader), Box::new(CsvLoader)];
        #[cfg(feature = "pdf")]
        loaders.push(Box::new(super::PdfLoader));
        Self {
            loaders,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl std::fmt::Debug for DocumentReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentReader")
            .field("extensions", &self.supported_extensions())
            .field("max_file_size", &self.max_file_size)
            .finish()
    }
}

impl DocumentReader {
    /// # Errors
    ///
    /// Returns [`DocumentError::FileTooLarge`] above the size limit,
    /// [`DocumentError::UnsupportedFormat`] for unknown extensions, or the loader's error.
    pub async fn read(&self, file: &UploadedFile) -> Result<Document, DocumentError> {
        let size = file.bytes.len() as u64;
        if size > self.max_file_size {
            return Err(DocumentError::FileTooLarge(size));
        }

        let ext = file.extension();
        let loader = self
            .loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .ok_or(DocumentError::UnsupportedFormat(ext))?;

        loader.load(file).await
    }

    #[must_use]
    pub fn supported_extensions(&self) -> Vec<&str> {
        self.loaders
            .iter()
            .flat_map(|l| l.supported_extensions().iter().copied())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FileType;

    #[tokio::test]
    async fn dispatches_by_extension() {
        let reader = DocumentReader::default();
        let doc = reader
            .read(&UploadedFile::new("Notes.TXT", "plain"))
            .await
            .unwrap();
        assert_eq!(doc.file_type, FileType::Text);

        let doc = reader
            .read(&UploadedFile::new("ledger.csv", "a,b\n1,2\n"))
            .await
            .unwrap();
        assert_eq!(doc.file_type, FileType::Csv);
    }

    #[tokio::test]
    async fn unsupported_extension() {
        let reader = DocumentReader::default();
        let result = reader
            .read(&UploadedFile::new("taxes.docx", vec![1, 2, 3]))
            .await;
        match result {
            Err(DocumentError::UnsupportedFormat(ext)) => assert_eq!(ext, "docx"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn file_too_large_rejected() {
        let reader = DocumentReader {
            max_file_size: 3,
            ..DocumentReader::default()
        };
        let result = reader.read(&UploadedFile::new("big.txt", "four")).await;
        assert!(matches!(result, Err(DocumentError::FileTooLarge(4))));
    }

    #[test]
    fn supported_extensions_list() {
        let reader = DocumentReader::default();
        let exts = reader.supported_extensions();
        assert!(exts.contains(&"txt"));
        assert!(exts.contains(&"csv"));
        #[cfg(feature = "pdf")]
        assert!(exts.contains(&"pdf"));
    }
}
