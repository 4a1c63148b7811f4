//! Data types for documents, chunks, search results and ingestion outcomes.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// An uploaded file: its name, raw bytes and user-supplied metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDocument {
    /// The filename, used as the document identifier.
    pub filename: String,
    /// The raw byte content as uploaded.
    pub content: Vec<u8>,
    /// Key-value metadata (for example a document type) copied onto every chunk.
    pub metadata: HashMap<String, String>,
}

impl SourceDocument {
    /// Create a document with no metadata.
    pub fn new(filename: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self { filename: filename.into(), content: content.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Detect the container format from the magic header, then the extension.
    pub fn kind(&self) -> DocumentKind {
        DocumentKind::detect(&self.filename, &self.content)
    }
}

/// The container formats the extractor understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// A PDF file.
    Pdf,
    /// UTF-8 text (plain text, markdown, CSV).
    PlainText,
    /// Anything else.
    Unsupported,
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const TEXT_EXTENSIONS: &[&str] = &["txt", "text", "md", "markdown", "csv"];

impl DocumentKind {
    /// Classify a document by content first and filename second.
    pub fn detect(filename: &str, content: &[u8]) -> Self {
        if content.starts_with(PDF_MAGIC) {
            return DocumentKind::Pdf;
        }
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("pdf") => DocumentKind::Pdf,
            Some(ext) if TEXT_EXTENSIONS.contains(&ext) => DocumentKind::PlainText,
            _ => DocumentKind::Unsupported,
        }
    }
}

/// The ordered page texts extracted from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedText {
    /// Page texts in document order. Pages without text are empty strings.
    pub pages: Vec<String>,
    /// Non-fatal problems noticed during extraction.
    pub warnings: Vec<String>,
}

impl ExtractedText {
    /// Join all pages with a newline, the form handed to the chunker.
    pub fn text(&self) -> String {
        self.pages.join("\n")
    }

    /// True when no page carries any non-whitespace text.
    pub fn is_blank(&self) -> bool {
        self.pages.iter().all(|page| page.trim().is_empty())
    }
}

/// A bounded segment of a document's text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// The filename of the parent document.
    pub document_id: String,
    /// Zero-based position of this chunk within its document.
    pub index: usize,
    /// Number of chunks the parent document was split into.
    pub total_chunks: usize,
    /// Offset of the first character of this chunk in the document text.
    pub char_start: usize,
    /// The chunk text.
    pub text: String,
    /// Metadata inherited from the parent document.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with its distance to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Distance to the query vector (lower is closer).
    pub distance: f32,
}

impl SearchResult {
    /// The chunk text.
    pub fn text(&self) -> &str {
        &self.chunk.text
    }

    /// The filename the chunk came from.
    pub fn source(&self) -> &str {
        &self.chunk.document_id
    }

    /// The chunk's position within its document.
    pub fn chunk_index(&self) -> usize {
        self.chunk.index
    }
}

/// The outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResult {
    /// The document's filename.
    pub filename: String,
    /// Whether the document's chunks were added to the index.
    pub success: bool,
    /// Number of chunks added to the index.
    pub chunks_indexed: usize,
    /// Why the document was not indexed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Non-fatal problems, such as pages without text.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl IngestResult {
    pub(crate) fn indexed(filename: &str, chunks_indexed: usize, warnings: Vec<String>) -> Self {
        Self {
            filename: filename.to_string(),
            success: true,
            chunks_indexed,
            error: None,
            warnings,
        }
    }

    pub(crate) fn failed(filename: &str, error: impl ToString, warnings: Vec<String>) -> Self {
        Self {
            filename: filename.to_string(),
            success: false,
            chunks_indexed: 0,
            error: Some(error.to_string()),
            warnings,
        }
    }
}

/// Per-document outcomes of a batch ingestion, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    /// One entry per submitted document.
    pub outcomes: Vec<IngestResult>,
}

impl IngestReport {
    /// Number of documents that were indexed.
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.success).count()
    }

    /// The documents that failed, with their reasons.
    pub fn failures(&self) -> Vec<&IngestResult> {
        self.outcomes.iter().filter(|outcome| !outcome.success).collect()
    }

    /// Total chunks added across all documents.
    pub fn chunks_indexed(&self) -> usize {
        self.outcomes.iter().map(|outcome| outcome.chunks_indexed).sum()
    }
}
