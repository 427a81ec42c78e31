//! Error types for the `ragswitch-rag` crate.

use std::path::PathBuf;

use ragswitch_model::ModelError;
use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A remote embedding backend failed (network, auth, or malformed reply).
    #[error("Embedding error ({provider}): {message}")]
    ProviderError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A local embedding model could not be initialised.
    #[error("Failed to load embedding model '{model}': {message}")]
    ModelLoadError {
        /// The model that failed to load.
        model: String,
        /// A description of the failure.
        message: String,
    },

    /// The document directory does not exist.
    #[error("Directory not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during document chunking.
    #[error("Chunking error: {0}")]
    ChunkingError(String),

    /// Filesystem failure while loading documents or persisting the index.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A generation provider failed or was misconfigured.
    #[error(transparent)]
    Generation(#[from] ModelError),

    /// A query failed; `source` holds the underlying cause unchanged.
    #[error("Chat failed for query '{query}': {source}")]
    ChatError {
        /// The user query being answered.
        query: String,
        /// What went wrong underneath.
        #[source]
        source: Box<RagError>,
    },
}

impl RagError {
    /// Whether this is (or wraps) an unknown-provider error.
    pub fn is_invalid_provider(&self) -> bool {
        matches!(self, Self::Generation(ModelError::InvalidProvider(_)))
    }

    /// Strip a [`RagError::ChatError`] wrapper, returning the underlying cause.
    pub fn root(&self) -> &RagError {
        match self {
            Self::ChatError { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
