//! Rendering retrieved chunks as an evidence block for answer synthesis.

use serde::Serialize;

use crate::document::SearchResult;

/// Metadata key shown as the `Type:` line of an evidence entry.
pub const DOC_TYPE_KEY: &str = "doc_type";

/// Retrieved chunks formatted for inclusion in a synthesis prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EvidenceBlock {
    /// The rendered text, never longer than the requested limit.
    pub text: String,
    /// Number of results rendered.
    pub included: usize,
    /// Number of results left out to respect the limit.
    pub omitted: usize,
}

impl EvidenceBlock {
    /// True when no result was rendered.
    pub fn is_empty(&self) -> bool {
        self.included == 0
    }
}

fn render_entry(position: usize, result: &SearchResult) -> String {
    let chunk = &result.chunk;
    let doc_type = chunk
        .metadata
        .get(DOC_TYPE_KEY)
        .map(|doc_type| format!("Type: {doc_type}\n"))
        .unwrap_or_default();
    format!(
        "--- Document Source {position} ---\n\
         Title: {} (Chunk {} of {})\n\
         {doc_type}\
         Content: {}\n\
         Distance: {:.4}\n\
         ---\n",
        chunk.document_id,
        chunk.index + 1,
        chunk.total_chunks,
        chunk.text,
        result.distance
    )
}

/// Render `results` in order, stopping before the block would exceed
/// `max_chars` characters.
///
/// Results are expected closest first, so truncation drops the least relevant
/// evidence. Once one entry does not fit, it and all later entries are
/// counted as omitted.
pub fn render_evidence(results: &[SearchResult], max_chars: usize) -> EvidenceBlock {
    let mut block = EvidenceBlock::default();
    let mut used = 0;

    for (i, result) in results.iter().enumerate() {
        let entry = render_entry(i + 1, result);
        let entry_chars = entry.chars().count();
        if used + entry_chars > max_chars {
            block.omitted = results.len() - i;
            break;
        }
        used += entry_chars;
        block.text.push_str(&entry);
        block.included += 1;
    }

    block
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::document::Chunk;

    fn result(document_id: &str, index: usize, text: &str, distance: f32) -> SearchResult {
        SearchResult {
            chunk: Chunk {
                document_id: document_id.to_string(),
                index,
                total_chunks: 4,
                char_start: 0,
                text: text.to_string(),
                metadata: HashMap::from([(DOC_TYPE_KEY.to_string(), "Review".to_string())]),
            },
            distance,
        }
    }

    #[test]
    fn entries_are_numbered_and_labelled() {
        let block = render_evidence(&[result("trial.pdf", 1, "Dosage was 5mg.", 0.25)], 10_000);
        assert_eq!(
            block.text,
            "--- Document Source 1 ---\n\
             Title: trial.pdf (Chunk 2 of 4)\n\
             Type: Review\n\
             Content: Dosage was 5mg.\n\
             Distance: 0.2500\n\
             ---\n"
        );
        assert_eq!(block.included, 1);
        assert_eq!(block.omitted, 0);
    }

    #[test]
    fn untyped_chunks_have_no_type_line() {
        let mut untyped = result("notes.txt", 0, "Raw notes.", 1.5);
        untyped.chunk.metadata.clear();
        let block = render_evidence(&[untyped], 10_000);
        assert_eq!(
            block.text,
            "--- Document Source 1 ---\n\
             Title: notes.txt (Chunk 1 of 4)\n\
             Content: Raw notes.\n\
             Distance: 1.5000\n\
             ---\n"
        );
    }

    #[test]
    fn block_respects_character_limit() {
        let results: Vec<SearchResult> =
            (0..5).map(|i| result("a.txt", i, &"x".repeat(100), i as f32)).collect();
        let one_entry = render_evidence(&results[..1], usize::MAX).text.chars().count();

        let block = render_evidence(&results, one_entry * 2 + 10);
        assert_eq!(block.included, 2);
        assert_eq!(block.omitted, 3);
        assert!(block.text.chars().count() <= one_entry * 2 + 10);
    }

    #[test]
    fn no_results_render_an_empty_block() {
        let block = render_evidence(&[], 100);
        assert!(block.is_empty());
        assert!(block.text.is_empty());
    }
}
