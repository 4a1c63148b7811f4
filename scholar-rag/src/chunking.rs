//! Document chunking strategies.
//!
//! This module provides the [`Chunker`] trait and two implementations:
//!
//! - [`FixedSizeChunker`] - a sliding window of `chunk_size` characters that
//!   advances by `chunk_size - chunk_overlap`
//! - [`RecursiveChunker`] - splits hierarchically by paragraphs, lines,
//!   sentences, then words, and merges the pieces up to `chunk_size`
//!
//! All sizes are counted in characters (Unicode scalar values), so a chunk
//! boundary never falls inside a multi-byte character.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::error::{RagError, Result};

/// A strategy for splitting a document's text into chunks.
pub trait Chunker: Send + Sync {
    /// Split `text` into chunks owned by `document_id`.
    ///
    /// Returns an empty `Vec` for empty text. Each chunk inherits `metadata`.
    fn chunk(&self, document_id: &str, text: &str, metadata: &HashMap<String, String>)
    -> Vec<Chunk>;
}

/// Which [`Chunker`] a pipeline uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChunkingStrategy {
    /// Fixed-size sliding window; see [`FixedSizeChunker`].
    #[default]
    SlidingWindow,
    /// Separator-aware splitting; see [`RecursiveChunker`].
    Recursive,
}

impl ChunkingStrategy {
    /// Construct the chunker for this strategy.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] if the size parameters are invalid.
    pub fn build(self, chunk_size: usize, chunk_overlap: usize) -> Result<Arc<dyn Chunker>> {
        Ok(match self {
            ChunkingStrategy::SlidingWindow => {
                Arc::new(FixedSizeChunker::new(chunk_size, chunk_overlap)?)
            }
            ChunkingStrategy::Recursive => {
                Arc::new(RecursiveChunker::new(chunk_size, chunk_overlap)?)
            }
        })
    }
}

fn check_sizes(chunk_size: usize, chunk_overlap: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(RagError::ChunkingError("chunk_size must be greater than zero".to_string()));
    }
    if chunk_overlap >= chunk_size {
        return Err(RagError::ChunkingError(format!(
            "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }
    Ok(())
}

/// Byte offsets of every character boundary in `text`, including `text.len()`.
fn char_boundaries(text: &str) -> Vec<usize> {
    text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect()
}

/// Sliding-window split returning `(char_start, slice)` pairs.
///
/// Assumes validated sizes. The window stops once it reaches the end of the
/// text, so the last chunk is never made up entirely of overlap.
fn sliding_windows(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<(usize, &str)> {
    if text.is_empty() {
        return Vec::new();
    }

    let boundaries = char_boundaries(text);
    let char_count = boundaries.len() - 1;
    let step = chunk_size - chunk_overlap;

    let mut windows = Vec::with_capacity(char_count / step + 1);
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(char_count);
        windows.push((start, &text[boundaries[start]..boundaries[end]]));
        if end == char_count {
            break;
        }
        start += step;
    }
    windows
}

/// Split `text` with a sliding window of `chunk_size` characters advancing by
/// `chunk_size - chunk_overlap`.
///
/// Text no longer than `chunk_size` yields a single chunk equal to the text;
/// empty text yields no chunks.
///
/// # Errors
///
/// Returns [`RagError::ChunkingError`] unless `chunk_size > 0` and
/// `chunk_overlap < chunk_size`.
///
/// # Example
///
/// ```rust
/// use scholar_rag::chunking::chunk_text;
///
/// let text = "a".repeat(250);
/// let lengths: Vec<usize> =
///     chunk_text(&text, 100, 20).unwrap().iter().map(|c| c.chars().count()).collect();
/// assert_eq!(lengths, vec![100, 100, 90]);
/// ```
pub fn chunk_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Result<Vec<String>> {
    check_sizes(chunk_size, chunk_overlap)?;
    Ok(sliding_windows(text, chunk_size, chunk_overlap)
        .into_iter()
        .map(|(_, slice)| slice.to_string())
        .collect())
}

fn into_chunks(
    document_id: &str,
    metadata: &HashMap<String, String>,
    pieces: Vec<(usize, String)>,
) -> Vec<Chunk> {
    let total_chunks = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(index, (char_start, text))| Chunk {
            document_id: document_id.to_string(),
            index,
            total_chunks,
            char_start,
            text,
            metadata: metadata.clone(),
        })
        .collect()
}

/// Splits text into fixed-size chunks by character count with configurable overlap.
///
/// Consecutive chunks share exactly `chunk_overlap` characters, so dropping
/// the first `chunk_overlap` characters of every chunk after the first and
/// concatenating reconstructs the input.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::FixedSizeChunker;
///
/// let chunker = FixedSizeChunker::new(256, 50)?;
/// let chunks = chunker.chunk("paper.pdf", &text, &HashMap::new());
/// ```
#[derive(Debug, Clone)]
pub struct FixedSizeChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl FixedSizeChunker {
    /// Create a new `FixedSizeChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per chunk
    /// * `chunk_overlap` - number of overlapping characters between consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] unless `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizes(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }

    /// The overlap between consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }
}

impl Chunker for FixedSizeChunker {
    fn chunk(
        &self,
        document_id: &str,
        text: &str,
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk> {
        let pieces = sliding_windows(text, self.chunk_size, self.chunk_overlap)
            .into_iter()
            .map(|(start, slice)| (start, slice.to_string()))
            .collect();
        into_chunks(document_id, metadata, pieces)
    }
}

/// Splits text hierarchically: paragraphs → lines → sentences → words.
///
/// Pieces are merged greedily up to `chunk_size`. When a chunk is emitted,
/// its trailing pieces totalling at most `chunk_overlap` characters are
/// carried into the next chunk. A single word longer than `chunk_size` is cut
/// with the sliding window.
///
/// # Example
///
/// ```rust,ignore
/// use scholar_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1000, 150)?;
/// let chunks = chunker.chunk("paper.pdf", &text, &HashMap::new());
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] unless `0 <= chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        check_sizes(chunk_size, chunk_overlap)?;
        Ok(Self { chunk_size, chunk_overlap })
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Break `text` into contiguous pieces of at most `chunk_size` characters,
/// preferring the earliest separator in `separators` that applies.
fn split_pieces<'a>(text: &'a str, chunk_size: usize, separators: &[&str], out: &mut Vec<&'a str>) {
    if text.chars().count() <= chunk_size {
        out.push(text);
        return;
    }

    let Some((separator, rest)) = separators.split_first() else {
        out.extend(sliding_windows(text, chunk_size, 0).into_iter().map(|(_, slice)| slice));
        return;
    };

    let segments = split_keeping_separator(text, separator);
    if segments.len() == 1 {
        split_pieces(text, chunk_size, rest, out);
        return;
    }
    for segment in segments {
        split_pieces(segment, chunk_size, rest, out);
    }
}

struct Piece<'a> {
    start: usize,
    len: usize,
    text: &'a str,
}

impl Chunker for RecursiveChunker {
    fn chunk(
        &self,
        document_id: &str,
        text: &str,
        metadata: &HashMap<String, String>,
    ) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut raw = Vec::new();
        split_pieces(text, self.chunk_size, SEPARATORS, &mut raw);

        let mut offset = 0;
        let pieces = raw.into_iter().map(|slice| {
            let len = slice.chars().count();
            let piece = Piece { start: offset, len, text: slice };
            offset += len;
            piece
        });

        let mut emitted: Vec<(usize, String)> = Vec::new();
        let mut window: VecDeque<Piece<'_>> = VecDeque::new();
        let mut window_len = 0;
        let mut has_unemitted = false;

        for piece in pieces {
            if window_len + piece.len > self.chunk_size {
                if has_unemitted {
                    emit_window(&window, &mut emitted);
                    while window_len > self.chunk_overlap {
                        if let Some(front) = window.pop_front() {
                            window_len -= front.len;
                        }
                    }
                }
                while window_len + piece.len > self.chunk_size {
                    match window.pop_front() {
                        Some(front) => window_len -= front.len,
                        None => break,
                    }
                }
            }
            window_len += piece.len;
            window.push_back(piece);
            has_unemitted = true;
        }
        if has_unemitted {
            emit_window(&window, &mut emitted);
        }

        into_chunks(document_id, metadata, emitted)
    }
}

fn emit_window(window: &VecDeque<Piece<'_>>, emitted: &mut Vec<(usize, String)>) {
    if let Some(first) = window.front() {
        let text: String = window.iter().map(|piece| piece.text).collect();
        emitted.push((first.start, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lengths(chunks: &[String]) -> Vec<usize> {
        chunks.iter().map(|c| c.chars().count()).collect()
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunk_text("hello", 100, 20).unwrap();
        assert_eq!(chunks, vec!["hello"]);
    }

    #[test]
    fn text_of_exactly_chunk_size_is_a_single_chunk() {
        let text = "x".repeat(100);
        assert_eq!(chunk_text(&text, 100, 20).unwrap().len(), 1);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn window_stops_at_end_of_text() {
        let text: String = (0..250).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 100, 20).unwrap();
        assert_eq!(lengths(&chunks), vec![100, 100, 90]);
        assert_eq!(chunks[1], text[80..180]);
        assert_eq!(chunks[2], text[160..250]);
    }

    #[test]
    fn multibyte_characters_are_never_split() {
        let text = "αβγδε".repeat(10);
        let chunks = chunk_text(&text, 7, 3).unwrap();
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
        assert_eq!(chunks[0], "αβγδεαβ");
    }

    #[test]
    fn invalid_sizes_are_rejected() {
        assert!(matches!(chunk_text("abc", 0, 0), Err(RagError::ChunkingError(_))));
        assert!(matches!(chunk_text("abc", 5, 5), Err(RagError::ChunkingError(_))));
        assert!(FixedSizeChunker::new(10, 12).is_err());
        assert!(RecursiveChunker::new(10, 10).is_err());
    }

    #[test]
    fn fixed_size_chunks_carry_positions_and_metadata() {
        let metadata = HashMap::from([("doc_type".to_string(), "review".to_string())]);
        let chunker = FixedSizeChunker::new(4, 1).unwrap();
        let chunks = chunker.chunk("a.txt", "abcdefghij", &metadata);
        let starts: Vec<usize> = chunks.iter().map(|c| c.char_start).collect();
        assert_eq!(starts, vec![0, 3, 6]);
        assert!(chunks.iter().all(|c| c.total_chunks == 3 && c.document_id == "a.txt"));
        assert_eq!(chunks[2].metadata.get("doc_type").map(String::as_str), Some("review"));
    }

    #[test]
    fn recursive_prefers_paragraph_boundaries() {
        let text = "First paragraph here.\n\nSecond paragraph here.";
        let chunker = RecursiveChunker::new(30, 0).unwrap();
        let chunks = chunker.chunk("a.txt", text, &HashMap::new());
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First paragraph here.\n\n");
        assert_eq!(chunks[1].text, "Second paragraph here.");
        assert_eq!(chunks[1].char_start, 23);
    }

    #[test]
    fn recursive_respects_size_and_overlap() {
        let text = "one two three four five six seven eight nine ten eleven twelve";
        let chunker = RecursiveChunker::new(20, 8).unwrap();
        let chunks = chunker.chunk("a.txt", text, &HashMap::new());
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 20, "chunk too long: {:?}", chunk.text);
        }
        for pair in chunks.windows(2) {
            let prev_end = pair[0].char_start + pair[0].text.chars().count();
            assert!(pair[1].char_start <= prev_end);
            assert!(prev_end - pair[1].char_start <= 8);
        }
    }

    #[test]
    fn recursive_cuts_overlong_words() {
        let text = "x".repeat(45);
        let chunker = RecursiveChunker::new(20, 5).unwrap();
        let chunks = chunker.chunk("a.txt", &text, &HashMap::new());
        assert_eq!(chunks.iter().map(|c| c.text.len()).collect::<Vec<_>>(), vec![20, 20, 5]);
    }
}
