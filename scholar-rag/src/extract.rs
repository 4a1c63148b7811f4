//! Text extraction from uploaded documents.
//!
//! This module provides the [`TextExtractor`] trait and two implementations:
//!
//! - [`PdfExtractor`] - per-page text from text-based PDFs (no OCR)
//! - [`PlainTextExtractor`] - UTF-8 text, with form feeds as page breaks
//!
//! [`ExtractorRegistry`] picks one by [`DocumentKind`]. Extraction never panics
//! past the caller: malformed input becomes [`RagError::ExtractionFailure`] and
//! pages without text become warnings on the [`ExtractedText`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::document::{DocumentKind, ExtractedText, SourceDocument};
use crate::error::{RagError, Result};

/// A strategy for turning a document's bytes into page texts.
pub trait TextExtractor: Send + Sync {
    /// Extract the ordered page texts of `content`.
    ///
    /// `filename` is used for error messages and warnings only.
    fn extract(&self, filename: &str, content: &[u8]) -> Result<ExtractedText>;
}

fn empty_page_warnings(filename: &str, pages: &[String]) -> Vec<String> {
    pages
        .iter()
        .enumerate()
        .filter(|(_, page)| page.trim().is_empty())
        .map(|(i, _)| {
            format!(
                "page {} of '{filename}' has no extractable text (image-only pages are not OCR'd)",
                i + 1
            )
        })
        .collect()
}

/// Extracts text from text-based PDF documents.
///
/// Encrypted, corrupted and truncated files fail with
/// [`RagError::ExtractionFailure`]. The underlying parser is known to panic on
/// some malformed inputs; those panics are caught and reported the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, filename: &str, content: &[u8]) -> Result<ExtractedText> {
        let failure = |message: String| RagError::ExtractionFailure {
            document: filename.to_string(),
            message,
        };

        let parsed = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(content)
        }))
        .map_err(|_| failure("PDF parser aborted on malformed input".to_string()))?;

        let pages = parsed.map_err(|e| {
            failure(format!("file is corrupted, encrypted or not a text-based PDF: {e}"))
        })?;

        let warnings = empty_page_warnings(filename, &pages);
        debug!(document.id = filename, page_count = pages.len(), "extracted PDF pages");
        Ok(ExtractedText { pages, warnings })
    }
}

/// Decodes UTF-8 text documents.
///
/// A leading byte-order mark is dropped and form feed characters split pages.
/// Content that is not valid UTF-8, or that contains NUL bytes, is treated as
/// binary and rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextExtractor;

const PAGE_BREAK: char = '\x0c';
const UTF8_BOM: &str = "\u{feff}";

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, filename: &str, content: &[u8]) -> Result<ExtractedText> {
        if content.contains(&0) {
            return Err(RagError::ExtractionFailure {
                document: filename.to_string(),
                message: "content contains NUL bytes; not a text document".to_string(),
            });
        }
        let text = std::str::from_utf8(content).map_err(|e| RagError::ExtractionFailure {
            document: filename.to_string(),
            message: format!("content is not valid UTF-8: {e}"),
        })?;
        let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

        let pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
        let warnings =
            if pages.len() > 1 { empty_page_warnings(filename, &pages) } else { Vec::new() };
        Ok(ExtractedText { pages, warnings })
    }
}

/// Dispatches documents to the extractor for their [`DocumentKind`].
#[derive(Clone)]
pub struct ExtractorRegistry {
    pdf: Arc<dyn TextExtractor>,
    plain_text: Arc<dyn TextExtractor>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self { pdf: Arc::new(PdfExtractor), plain_text: Arc::new(PlainTextExtractor) }
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry").finish_non_exhaustive()
    }
}

impl ExtractorRegistry {
    /// Create a registry with the built-in extractors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the extractor used for PDF documents.
    pub fn with_pdf_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.pdf = extractor;
        self
    }

    /// Replace the extractor used for plain-text documents.
    pub fn with_plain_text_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.plain_text = extractor;
        self
    }

    /// Extract the pages of `document`, logging any warnings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ExtractionFailure`] for unsupported formats and
    /// for content the selected extractor cannot read.
    pub fn extract(&self, document: &SourceDocument) -> Result<ExtractedText> {
        let extractor = match document.kind() {
            DocumentKind::Pdf => &self.pdf,
            DocumentKind::PlainText => &self.plain_text,
            DocumentKind::Unsupported => {
                return Err(RagError::ExtractionFailure {
                    document: document.filename.clone(),
                    message: "unsupported document type".to_string(),
                });
            }
        };

        let extracted = extractor.extract(&document.filename, &document.content)?;
        for warning in &extracted.warnings {
            warn!(document.id = %document.filename, "{warning}");
        }
        Ok(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_splits_pages_on_form_feed() {
        let extracted = PlainTextExtractor.extract("a.txt", b"first\x0csecond").unwrap();
        assert_eq!(extracted.pages, vec!["first", "second"]);
        assert!(extracted.warnings.is_empty());
    }

    #[test]
    fn plain_text_warns_about_empty_pages() {
        let extracted = PlainTextExtractor.extract("a.txt", b"first\x0c  \x0cthird").unwrap();
        assert_eq!(extracted.pages.len(), 3);
        assert_eq!(extracted.warnings.len(), 1);
        assert!(extracted.warnings[0].contains("page 2"));
    }

    #[test]
    fn plain_text_strips_bom() {
        let extracted = PlainTextExtractor.extract("a.txt", "\u{feff}hello".as_bytes()).unwrap();
        assert_eq!(extracted.pages, vec!["hello"]);
    }

    #[test]
    fn invalid_utf8_is_an_extraction_failure() {
        let err = PlainTextExtractor.extract("bad.txt", &[0x66, 0xff, 0xfe, 0x6f]).unwrap_err();
        assert!(
            matches!(err, RagError::ExtractionFailure { document, .. } if document == "bad.txt")
        );
    }

    #[test]
    fn nul_bytes_are_rejected() {
        assert!(PlainTextExtractor.extract("bin.txt", b"abc\0def").is_err());
    }

    #[test]
    fn corrupted_pdf_is_an_extraction_failure() {
        let err = PdfExtractor.extract("broken.pdf", b"%PDF-1.4\nthis is not a pdf body").unwrap_err();
        assert!(
            matches!(err, RagError::ExtractionFailure { document, .. } if document == "broken.pdf")
        );
    }

    #[test]
    fn registry_rejects_unsupported_documents() {
        let document = SourceDocument::new("photo.jpg", vec![0xff, 0xd8, 0xff]);
        let err = ExtractorRegistry::new().extract(&document).unwrap_err();
        assert!(matches!(err, RagError::ExtractionFailure { message, .. } if message.contains("unsupported")));
    }

    #[test]
    fn registry_routes_text_documents() {
        let document = SourceDocument::new("notes.md", "# Title\nbody");
        let extracted = ExtractorRegistry::new().extract(&document).unwrap();
        assert_eq!(extracted.text(), "# Title\nbody");
    }
}
