//! Property tests for the chunkers.

use std::collections::HashMap;

use proptest::prelude::*;
use scholar_rag::chunking::{Chunker, FixedSizeChunker, RecursiveChunker, chunk_text};

/// Chunk size and an overlap strictly smaller than it.
fn arb_sizes() -> impl Strategy<Value = (usize, usize)> {
    (1usize..64).prop_flat_map(|size| (Just(size), 0..size))
}

/// Text mixing ASCII, whitespace, punctuation and multi-byte characters.
fn arb_text() -> impl Strategy<Value = String> {
    "[a-zé漢 .!?\n]{0,400}"
}

/// **Property: sliding-window reconstruction**
/// *For any* text and valid sizes, dropping the first `chunk_overlap`
/// characters of every chunk after the first and concatenating SHALL
/// reproduce the text, and no chunk SHALL exceed `chunk_size` characters.
mod prop_sliding_window {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn chunks_reconstruct_the_text(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunks = chunk_text(&text, size, overlap).unwrap();

            let mut rebuilt = String::new();
            for (i, chunk) in chunks.iter().enumerate() {
                let skip = if i == 0 { 0 } else { overlap };
                rebuilt.extend(chunk.chars().skip(skip));
            }
            prop_assert_eq!(rebuilt, text);
        }

        #[test]
        fn chunks_respect_the_size_bound(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chunks = chunk_text(&text, size, overlap).unwrap();
            prop_assert_eq!(chunks.is_empty(), text.is_empty());
            for chunk in &chunks {
                let len = chunk.chars().count();
                prop_assert!(len >= 1 && len <= size);
            }
        }

        #[test]
        fn chunker_offsets_point_into_the_text(text in arb_text(), (size, overlap) in arb_sizes()) {
            let chars: Vec<char> = text.chars().collect();
            let chunker = FixedSizeChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk("doc.txt", &text, &HashMap::new());

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert_eq!(chunk.total_chunks, chunks.len());
                prop_assert_eq!(chunk.char_start, i * (size - overlap));
                let len = chunk.text.chars().count();
                let expected: String = chars[chunk.char_start..chunk.char_start + len].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
            }
        }
    }
}

/// **Property: recursive chunking coverage**
/// *For any* text, recursive chunks SHALL be contiguous slices of the text no
/// longer than `chunk_size`, together covering every character.
mod prop_recursive {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(300))]

        #[test]
        fn chunks_are_bounded_slices_covering_the_text(
            text in arb_text(),
            (size, overlap) in arb_sizes(),
        ) {
            let chars: Vec<char> = text.chars().collect();
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            let chunks = chunker.chunk("doc.txt", &text, &HashMap::new());

            prop_assert_eq!(chunks.is_empty(), text.is_empty());
            let mut covered = 0;
            for chunk in &chunks {
                let len = chunk.text.chars().count();
                prop_assert!(len >= 1 && len <= size);
                prop_assert!(chunk.char_start <= covered);
                let expected: String = chars[chunk.char_start..chunk.char_start + len].iter().collect();
                prop_assert_eq!(&chunk.text, &expected);
                covered = covered.max(chunk.char_start + len);
            }
            prop_assert_eq!(covered, chars.len());
        }
    }
}

#[test]
fn two_hundred_fifty_characters_make_three_chunks() {
    let text = "z".repeat(250);
    let chunks = chunk_text(&text, 100, 20).unwrap();
    let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
    assert_eq!(lengths, vec![100, 100, 90]);
}

#[test]
fn zero_overlap_partitions_the_text() {
    let chunks = chunk_text("abcdefghij", 3, 0).unwrap();
    assert_eq!(chunks, vec!["abc", "def", "ghi", "j"]);
}
