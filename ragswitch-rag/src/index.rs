//! The vector index: an embedding provider bound to one store collection.

use std::sync::Arc;

use tracing::{debug, info};

use crate::document::{Chunk, IndexRecord, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Default number of chunks embedded and written per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Embeds chunks and queries with one provider and stores them in one
/// collection of a [`VectorStore`].
///
/// The provider is fixed for the lifetime of the index, so stored vectors
/// and query vectors always share a space.
pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    collection: String,
    batch_size: usize,
}

impl VectorIndex {
    /// Bind `embedder` to `collection` in `store`, creating the collection
    /// if needed.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the collection already
    /// exists with a dimensionality other than the embedder's.
    pub async fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Result<Self> {
        let collection = collection.into();
        store.create_collection(&collection, embedder.dimensions()).await?;
        info!(
            collection = %collection,
            model = embedder.model_name(),
            dimensions = embedder.dimensions(),
            "vector index ready"
        );
        Ok(Self { embedder, store, collection, batch_size: DEFAULT_BATCH_SIZE })
    }

    /// Override the ingestion batch size.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `batch_size` is zero.
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(RagError::ConfigError("batch_size must be greater than zero".to_string()));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    /// The collection this index writes to.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// The embedding provider.
    pub fn embedder(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedder
    }

    /// Embed and store `chunks`, batch by batch.
    ///
    /// Ids continue from the current record count (`chunk_{n}`). Each batch
    /// is written atomically; if a later batch fails, earlier ones remain.
    pub async fn add(&self, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let mut next_id = self.store.count(&self.collection).await?;
        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<&str> = batch.iter().map(|c| c.content.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(RagError::ProviderError {
                    provider: self.embedder.model_name().to_string(),
                    message: format!(
                        "expected {} embeddings, got {}",
                        batch.len(),
                        embeddings.len()
                    ),
                });
            }

            let records: Vec<IndexRecord> = batch
                .iter()
                .zip(embeddings)
                .enumerate()
                .map(|(i, (chunk, embedding))| IndexRecord {
                    id: format!("chunk_{}", next_id + i),
                    embedding,
                    content: chunk.content.clone(),
                    metadata: chunk.metadata(),
                })
                .collect();

            self.store.add(&self.collection, &records).await?;
            next_id += records.len();
            debug!(
                collection = %self.collection,
                batch_size = records.len(),
                total = next_id,
                "stored batch"
            );
        }

        info!(collection = %self.collection, added = chunks.len(), total = next_id, "added chunks");
        Ok(())
    }

    /// Return up to `k` stored chunks closest to `query`, nearest first.
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchResult>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query).await?;
        let results = self.store.search(&self.collection, &embedding, k).await?;
        debug!(collection = %self.collection, k, hits = results.len(), "searched index");
        Ok(results)
    }

    /// Number of stored chunks.
    pub async fn count(&self) -> Result<usize> {
        self.store.count(&self.collection).await
    }

    /// Remove every stored chunk, keeping the collection.
    pub async fn clear(&self) -> Result<()> {
        self.store.delete_collection(&self.collection).await?;
        self.store.create_collection(&self.collection, self.embedder.dimensions()).await?;
        info!(collection = %self.collection, "cleared index");
        Ok(())
    }
}

impl std::fmt::Debug for VectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorIndex")
            .field("collection", &self.collection)
            .field("model", &self.embedder.model_name())
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}
