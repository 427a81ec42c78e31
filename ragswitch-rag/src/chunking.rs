//! Token-window chunking with overlap.
//!
//! A document is tokenized once; windows of `chunk_size` tokens are cut
//! every `chunk_size - chunk_overlap` tokens and each window is decoded back
//! to text. The last window is clipped to the end of the token stream.

use std::ops::Range;
use std::sync::Arc;

use tracing::debug;

use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::error::{RagError, Result};
use crate::tokenizer::{Cl100kTokenizer, Tokenizer};

/// Compute the token windows for a stream of `total` tokens.
///
/// Windows start at `0, step, 2*step, ...` where `step = chunk_size -
/// chunk_overlap`, and the sequence stops after the first window whose end
/// reaches `total`. Returns an empty `Vec` when `total == 0`.
///
/// Callers must guarantee `chunk_overlap < chunk_size`; [`TokenChunker`]
/// enforces this at construction.
pub fn token_windows(total: usize, chunk_size: usize, chunk_overlap: usize) -> Vec<Range<usize>> {
    debug_assert!(chunk_overlap < chunk_size);
    let step = chunk_size - chunk_overlap;

    let mut windows = Vec::with_capacity(total.div_ceil(step));
    let mut start = 0;
    while start < total {
        let end = (start + chunk_size).min(total);
        windows.push(start..end);
        if end >= total {
            break;
        }
        start += step;
    }
    windows
}

/// Splits documents into overlapping token-bounded [`Chunk`]s.
///
/// # Example
///
/// ```rust,ignore
/// use ragswitch_rag::{Document, TokenChunker};
///
/// let chunker = TokenChunker::new(500, 50)?;
/// let chunks = chunker.process_documents(&[Document::new(text, "guide.md")]);
/// ```
#[derive(Clone)]
pub struct TokenChunker {
    chunk_size: usize,
    chunk_overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
}

impl TokenChunker {
    /// Create a chunker using the `cl100k_base` tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `chunk_size == 0` or
    /// `chunk_overlap >= chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        Self::with_tokenizer(chunk_size, chunk_overlap, Arc::new(Cl100kTokenizer::new()?))
    }

    /// Create a chunker from the chunking fields of a [`RagConfig`].
    pub fn from_config(config: &RagConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Create a chunker with a custom tokenizer.
    pub fn with_tokenizer(
        chunk_size: usize,
        chunk_overlap: usize,
        tokenizer: Arc<dyn Tokenizer>,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap, tokenizer })
    }

    /// Maximum tokens per chunk.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Tokens shared by consecutive chunks.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// The tokenizer used to cut and decode windows.
    pub fn tokenizer(&self) -> &Arc<dyn Tokenizer> {
        &self.tokenizer
    }

    /// Split `text` into chunks numbered from 0.
    ///
    /// Returns an empty `Vec` if `text` has no tokens.
    pub fn chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        self.chunk_from(text, source, 0)
    }

    /// Chunk every document in order. `chunk_index` keeps counting across
    /// document boundaries, so indices are unique within one call.
    pub fn process_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut all_chunks = Vec::new();
        for document in documents {
            let chunks = self.chunk_from(&document.content, &document.source, all_chunks.len());
            all_chunks.extend(chunks);
        }
        debug!(documents = documents.len(), chunks = all_chunks.len(), "processed documents");
        all_chunks
    }

    fn chunk_from(&self, text: &str, source: &str, first_index: usize) -> Vec<Chunk> {
        let tokens = self.tokenizer.encode(text);
        token_windows(tokens.len(), self.chunk_size, self.chunk_overlap)
            .into_iter()
            .enumerate()
            .map(|(i, window)| Chunk {
                content: self.tokenizer.decode(&tokens[window.clone()]),
                source: source.to_string(),
                chunk_index: first_index + i,
                start_token: window.start,
                end_token: window.end,
            })
            .collect()
    }
}

impl std::fmt::Debug for TokenChunker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenChunker")
            .field("chunk_size", &self.chunk_size)
            .field("chunk_overlap", &self.chunk_overlap)
            .finish_non_exhaustive()
    }
}
