use std::fmt::Write as _;

use super::{Document, DocumentError, DocumentLoader, FileType, LoadFuture, UploadedFile};

/// Renders a CSV table as a labeled plain-text report, one block per row.
///
/// The first row is the header. Ragged rows are rejected rather than padded.
#[derive(Debug, Default)]
pub struct CsvLoader;

impl DocumentLoader for CsvLoader {
    fn load<'a>(&'a self, file: &'a UploadedFile) -> LoadFuture<'a> {
        Box::pin(async move { parse(file) })
    }

    fn file_type(&self) -> FileType {
        FileType::Csv
    }

    fn supported_extensions(&self) -> &[&str] {
        &["csv"]
    }
}

fn parse(file: &UploadedFile) -> Result<Document, DocumentError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file.bytes.as_slice());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
    if headers.is_empty() {
        return Err(DocumentError::EmptyCsv);
    }
    let records = reader
        .records()
        .collect::<Result<Vec<_>, csv::Error>>()?;

    Ok(Document {
        content: render_report(&file.filename, &headers, &records),
        filename: file.filename.clone(),
        file_type: FileType::Csv,
    })
}

fn render_report(filename: &str, headers: &[String], records: &[csv::StringRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Financial Data from {filename}:");
    out.push('\n');
    let _ = writeln!(out, "Total rows: {}", records.len());
    let _ = writeln!(out, "Total columns: {}", headers.len());
    let _ = writeln!(out, "Columns: {}", headers.join(", "));
    out.push('\n');

    for (i, record) in records.iter().enumerate() {
        let _ = writeln!(out, "Record {}:", i + 1);
        for (column, value) in headers.iter().zip(record.iter()) {
            let _ = writeln!(out, "  {column}: {value}");
        }
        out.push('\n');
    }
    out
}
