//! Data types for documents, chunks, index records, and search results.

use serde::{Deserialize, Serialize};

/// A source document loaded from disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// The raw text of the document.
    pub content: String,
    /// Where the text came from, usually a path relative to the corpus root.
    pub source: String,
}

impl Document {
    /// Create a document.
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self { content: content.into(), source: source.into() }
    }
}

/// A token-bounded segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Decoded text of the token window.
    pub content: String,
    /// The parent document's source.
    pub source: String,
    /// 0-based position within one chunking call.
    pub chunk_index: usize,
    /// First token of the window (inclusive).
    pub start_token: usize,
    /// End of the window (exclusive), clipped to the document length.
    pub end_token: usize,
}

impl Chunk {
    /// The metadata persisted next to this chunk's embedding.
    pub fn metadata(&self) -> ChunkMetadata {
        ChunkMetadata {
            source: self.source.clone(),
            chunk_index: self.chunk_index,
            start_token: self.start_token,
            end_token: self.end_token,
        }
    }
}

/// Provenance of a stored chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// The parent document's source.
    pub source: String,
    /// The chunk's `chunk_index`.
    pub chunk_index: usize,
    /// First token of the window.
    pub start_token: usize,
    /// End of the window (exclusive).
    pub end_token: usize,
}

/// A chunk with its embedding, as held by a vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexRecord {
    /// Unique, insertion-ordered identifier (`chunk_{n}`).
    pub id: String,
    /// The chunk's vector.
    pub embedding: Vec<f32>,
    /// The chunk's text.
    pub content: String,
    /// Provenance.
    pub metadata: ChunkMetadata,
}

/// One hit from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// The stored chunk text.
    pub content: String,
    /// Provenance of the chunk.
    pub metadata: ChunkMetadata,
    /// Cosine distance to the query (lower is closer).
    pub distance: Option<f32>,
}
