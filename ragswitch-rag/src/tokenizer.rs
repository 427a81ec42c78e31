//! Deterministic, decodable tokenization for chunking.

use std::sync::Arc;

use tiktoken_rs::CoreBPE;
use tracing::warn;

use crate::error::{RagError, Result};

/// Splits text into token ids and turns id slices back into text.
///
/// `encode` must be deterministic so that chunk boundaries are reproducible,
/// and `decode` must accept any contiguous slice of an `encode` result.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text`.
    fn encode(&self, text: &str) -> Vec<u32>;

    /// Decode a token slice. Byte sequences that are not valid UTF-8 on
    /// their own (a window edge inside a multi-byte character) decode to
    /// U+FFFD rather than failing.
    fn decode(&self, tokens: &[u32]) -> String;
}

/// The `cl100k_base` byte-pair encoding used by GPT-3.5/GPT-4 era models.
///
/// The merge table ships inside the binary, so construction needs no
/// network access.
#[derive(Clone)]
pub struct Cl100kTokenizer {
    bpe: Arc<CoreBPE>,
}

impl Cl100kTokenizer {
    /// Load the encoding.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ChunkingError`] if the bundled merge table cannot
    /// be parsed.
    pub fn new() -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| RagError::ChunkingError(format!("failed to load cl100k_base: {e}")))?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl std::fmt::Debug for Cl100kTokenizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cl100kTokenizer").finish_non_exhaustive()
    }
}

impl Tokenizer for Cl100kTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_ordinary(text)
    }

    fn decode(&self, tokens: &[u32]) -> String {
        let bytes: Vec<u8> = self
            .bpe
            ._decode_native_and_split(tokens.to_vec())
            .flatten()
            .collect();
        match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(token_count = tokens.len(), "window splits a character, decoding lossily");
                String::from_utf8_lossy(e.as_bytes()).into_owned()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_is_deterministic_and_decodes_back() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = "Ollama lets you run models locally.";
        let a = tokenizer.encode(text);
        let b = tokenizer.encode(text);
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert_eq!(tokenizer.decode(&a), text);
    }

    #[test]
    fn empty_text_has_no_tokens() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        assert!(tokenizer.encode("").is_empty());
        assert_eq!(tokenizer.decode(&[]), "");
    }

    const MIXED: &str = "日本語のテキスト 🦀 はい。東京都の天気予報です。";

    fn replacements(text: &str) -> usize {
        text.matches(char::REPLACEMENT_CHARACTER).count()
    }

    #[test]
    fn split_character_only_loses_the_edge() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = MIXED.repeat(3);
        let tokens = tokenizer.encode(&text);
        assert!(tokens.len() > 3);

        for end in 1..=tokens.len() {
            let decoded = tokenizer.decode(&tokens[..end]);
            assert!(replacements(&decoded) <= 1, "prefix {end}: {decoded:?}");
            assert!(text.starts_with(decoded.trim_end_matches(char::REPLACEMENT_CHARACTER)));
        }
        for start in 0..tokens.len() {
            let decoded = tokenizer.decode(&tokens[start..]);
            assert!(replacements(&decoded) <= 3, "suffix {start}: {decoded:?}");
            assert!(text.ends_with(decoded.trim_start_matches(char::REPLACEMENT_CHARACTER)));
        }
    }

    #[test]
    fn interior_window_keeps_whole_characters() {
        let tokenizer = Cl100kTokenizer::new().unwrap();
        let text = MIXED.repeat(3);
        let tokens = tokenizer.encode(&text);

        let decoded = tokenizer.decode(&tokens[3..]);
        assert!(replacements(&decoded) <= 3);
        assert!(decoded.ends_with(MIXED));
        assert!(decoded.contains("東京都の天気予報です。"));
    }
}
