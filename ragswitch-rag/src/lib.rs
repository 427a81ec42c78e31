//! # ragswitch-rag
//!
//! Retrieval-augmented generation with a switchable cloud/local backend.
//!
//! ## Overview
//!
//! The crate covers the retrieval side of the pipeline and the orchestrator
//! that ties it to a generation backend:
//!
//! - [`load_documents`] reads `.txt`, `.md` and `.rst` files from a directory
//! - [`TokenChunker`] splits them into overlapping token windows
//! - [`EmbeddingProvider`] turns text into vectors, locally
//!   ([`FastEmbedProvider`](fastembed::FastEmbedProvider), feature
//!   `local-embeddings`) or remotely
//!   ([`OpenAIEmbeddingProvider`](openai::OpenAIEmbeddingProvider), feature
//!   `openai`)
//! - [`VectorIndex`] stores chunk vectors in a [`VectorStore`]
//!   ([`InMemoryVectorStore`] or [`PersistentVectorStore`]) and answers
//!   cosine-distance queries
//! - [`RagChatbot`] retrieves context, builds the prompt and asks the active
//!   [`GenerationProvider`](ragswitch_model::GenerationProvider)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ragswitch_rag::*;
//!
//! let docs = load_documents("./sample_docs")?;
//! let chunks = TokenChunker::new(500, 50)?.process_documents(&docs);
//!
//! let store = Arc::new(PersistentVectorStore::open("./chroma_db")?);
//! let index = VectorIndex::new(embedder, store, "rag_documents").await?;
//! if index.count().await? == 0 {
//!     index.add(&chunks).await?;
//! }
//!
//! let config = RagConfig::default();
//! let bot = RagChatbot::new(Arc::new(index), cloud, local, LlmProvider::Local, &config)?;
//! println!("{}", bot.chat("What is RAG?", false).await?.answer);
//! ```

pub mod chatbot;
pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
#[cfg(feature = "local-embeddings")]
pub mod fastembed;
pub mod index;
pub mod inmemory;
pub mod loader;
#[cfg(feature = "openai")]
pub mod openai;
pub mod persistent;
pub mod tokenizer;
pub mod vectorstore;

pub use chatbot::{ChatResponse, NO_CONTEXT, RagChatbot, SYSTEM_PROMPT, build_context, build_prompt};
pub use chunking::{TokenChunker, token_windows};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, ChunkMetadata, Document, IndexRecord, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use index::{DEFAULT_BATCH_SIZE, VectorIndex};
pub use inmemory::InMemoryVectorStore;
pub use loader::load_documents;
pub use persistent::PersistentVectorStore;
pub use ragswitch_model::LlmProvider;
pub use tokenizer::{Cl100kTokenizer, Tokenizer};
pub use vectorstore::{VectorStore, cosine_distance, cosine_similarity};
