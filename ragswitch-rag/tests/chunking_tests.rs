//! Property tests for token windowing and chunk text.

use ragswitch_rag::chunking::{TokenChunker, token_windows};
use ragswitch_rag::document::Document;
use ragswitch_rag::tokenizer::{Cl100kTokenizer, Tokenizer};
use proptest::prelude::*;

/// Window sizes with overlap strictly below size.
fn arb_size_and_overlap() -> impl Strategy<Value = (usize, usize)> {
    (1usize..600).prop_flat_map(|size| (Just(size), 0..size))
}

/// Windows SHALL start at 0, advance by `size - overlap`, stay within `size`
/// tokens, cover `[0, total)` without gaps, and stop at the first window that
/// reaches `total`.
mod prop_window_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn windows_cover_stream_with_fixed_stride(
            total in 0usize..3000,
            (size, overlap) in arb_size_and_overlap(),
        ) {
            let windows = token_windows(total, size, overlap);

            if total == 0 {
                prop_assert!(windows.is_empty());
                return Ok(());
            }

            prop_assert_eq!(windows[0].start, 0);
            prop_assert_eq!(windows.last().unwrap().end, total);

            for w in &windows {
                prop_assert!(w.start < w.end);
                prop_assert!(w.end - w.start <= size);
                prop_assert!(w.end <= total);
            }
            for pair in windows.windows(2) {
                prop_assert_eq!(pair[1].start, pair[0].start + (size - overlap));
                prop_assert!(pair[1].start <= pair[0].end, "gap between windows");
                prop_assert!(pair[0].end < total, "window after the end was reached");
            }
        }
    }
}

/// With no overlap, decoded ASCII chunks SHALL concatenate back to the input.
mod prop_ascii_reassembly {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn disjoint_chunks_reassemble_text(
            text in "[a-zA-Z0-9 ,.!?\n]{0,400}",
            size in 1usize..64,
        ) {
            let chunker = TokenChunker::new(size, 0).unwrap();
            let chunks = chunker.chunk(&text, "prop.txt");
            let rebuilt: String = chunks.iter().map(|c| c.content.as_str()).collect();
            prop_assert_eq!(rebuilt, text);
        }
    }
}

#[test]
fn thousand_token_document_splits_at_450_and_900() {
    let tokenizer = Cl100kTokenizer::new().unwrap();
    // " a" is a single cl100k token; 1000 of them make exactly 1000 tokens.
    let text = " a".repeat(1000);
    assert_eq!(tokenizer.encode(&text).len(), 1000);

    let chunks = TokenChunker::new(500, 50).unwrap().chunk(&text, "long.txt");
    let ranges: Vec<_> = chunks.iter().map(|c| (c.start_token, c.end_token)).collect();
    assert_eq!(ranges, vec![(0, 500), (450, 950), (900, 1000)]);
}

#[test]
fn reencoded_chunks_are_contiguous_slices_of_the_source() {
    let tokenizer = Cl100kTokenizer::new().unwrap();
    let text = "the quick brown fox jumps over the lazy dog and then runs back home ".repeat(20);
    let source_tokens = tokenizer.encode(&text);

    let chunker = TokenChunker::new(37, 9).unwrap();
    for chunk in chunker.chunk(&text, "fox.txt") {
        let tokens = tokenizer.encode(&chunk.content);
        assert_eq!(tokens.as_slice(), &source_tokens[chunk.start_token..chunk.end_token]);
    }
}

#[test]
fn short_document_is_a_single_chunk() {
    let docs = vec![Document::new("Ollama lets you run models locally.", "ollama.md")];
    let chunks = TokenChunker::new(500, 50).unwrap().process_documents(&docs);
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, "Ollama lets you run models locally.");
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].start_token, 0);
}
