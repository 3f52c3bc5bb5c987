use super::{Document, DocumentLoader, FileType, LoadFuture, UploadedFile};

/// Strict UTF-8 plain text.
#[derive(Debug, Default)]
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load<'a>(&'a self, file: &'a UploadedFile) -> LoadFuture<'a> {
        Box::pin(async move {
            let content = String::from_utf8(file.bytes.clone())?;
            Ok(Document {
                content,
                filename: file.filename.clone(),
                file_type: FileType::Text,
            })
        })
    }

    fn file_type(&self) -> FileType {
        FileType::Text
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentError;

    #[tokio::test]
    async fn load_text_file() {
        let file = UploadedFile::new("notes.txt", "hello world");
        let doc = TextLoader.load(&file).await.unwrap();
        assert_eq!(doc.content, "hello world");
        assert_eq!(doc.filename, "notes.txt");
        assert_eq!(doc.file_type, FileType::Text);
    }

    #[tokio::test]
    async fn load_empty_file() {
        let file = UploadedFile::new("empty.txt", "");
        let doc = TextLoader.load(&file).await.unwrap();
        assert!(doc.content.is_empty());
    }

    #[tokio::test]
    async fn invalid_utf8_is_decode_error() {
        let file = UploadedFile::new("bad.txt", vec![0x66, 0x6f, 0xff, 0xfe]);
        let result = TextLoader.load(&file).await;
        assert!(matches!(result, Err(DocumentError::Decode(_))));
    }

    #[tokio::test]
    async fn multibyte_text_preserved() {
        let file = UploadedFile::new("eur.txt", "Miete: 950 €");
        let doc = TextLoader.load(&file).await.unwrap();
        assert_eq!(doc.content, "Miete: 950 €");
    }

    #[test]
    fn supported_extensions_list() {
        assert_eq!(TextLoader.supported_extensions(), &["txt"]);
    }
}
