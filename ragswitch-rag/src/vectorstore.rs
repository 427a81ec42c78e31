//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{IndexRecord, SearchResult};
use crate::error::{RagError, Result};

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named collections of [`IndexRecord`]s, each with a
/// fixed dimensionality recorded at creation. Records keep their insertion
/// order, which is what breaks ties between equally distant results.
///
/// # Example
///
/// ```rust,ignore
/// use ragswitch_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// store.add("docs", &records).await?;
/// let results = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists with the same
    /// dimensionality.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the collection exists with a
    /// different dimensionality.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Delete a named collection and all its data. No-op if it is missing.
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Append records to a collection. All embeddings must match the
    /// collection's dimensionality; on error nothing is written.
    async fn add(&self, collection: &str, records: &[IndexRecord]) -> Result<()>;

    /// Return the `top_k` records closest to `embedding`, by ascending cosine
    /// distance, ties in insertion order.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Number of records in a collection (0 if it is missing).
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// `1 - cosine_similarity`: 0 for identical directions, 2 for opposite ones.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Rank `records` against `query` and keep the `top_k` closest.
///
/// Shared by the store backends so they order results identically.
pub(crate) fn rank(records: &[IndexRecord], query: &[f32], top_k: usize) -> Vec<SearchResult> {
    if top_k == 0 {
        return Vec::new();
    }
    let mut scored: Vec<(f32, &IndexRecord)> =
        records.iter().map(|record| (cosine_distance(&record.embedding, query), record)).collect();

    // Stable and total. Equal distances keep insertion order; NaN of either
    // sign sorts last.
    scored.sort_by(|a, b| a.0.is_nan().cmp(&b.0.is_nan()).then(a.0.total_cmp(&b.0)));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(distance, record)| SearchResult {
            content: record.content.clone(),
            metadata: record.metadata.clone(),
            distance: Some(distance),
        })
        .collect()
}

/// Reject any record whose embedding length differs from `dimensions`.
pub(crate) fn check_dimensions(
    backend: &str,
    collection: &str,
    dimensions: usize,
    records: &[IndexRecord],
) -> Result<()> {
    match records.iter().find(|r| r.embedding.len() != dimensions) {
        Some(bad) => Err(RagError::VectorStoreError {
            backend: backend.to_string(),
            message: format!(
                "record '{}' has {} dimensions, collection '{collection}' expects {dimensions}",
                bad.id,
                bad.embedding.len()
            ),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = [0.3, -0.4, 0.5];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[-1.0, 0.0]) - 2.0).abs() < 1e-6);
        assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_orthogonal_to_everything() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_distance(&[0.0, 0.0], &[0.0, 0.0]), 1.0);
    }

    fn record(id: &str, embedding: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.to_string(),
            embedding,
            content: id.to_string(),
            metadata: crate::document::ChunkMetadata {
                source: "doc.md".to_string(),
                chunk_index: 0,
                start_token: 0,
                end_token: 1,
            },
        }
    }

    #[test]
    fn rank_puts_nan_distances_last() {
        // Both the dot product and the norm overflow, so this distance is NaN.
        let records = vec![
            record("overflow", vec![3e38, 3e38]),
            record("far", vec![-1.0, -1.0]),
            record("near", vec![1.0, 1.0]),
            record("near_again", vec![1.0, 1.0]),
        ];
        let query = [1.0, 1.0];
        assert!(cosine_distance(&records[0].embedding, &query).is_nan());

        let ranked = rank(&records, &query, 4);
        let order: Vec<&str> = ranked.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(order, ["near", "near_again", "far", "overflow"]);
        assert!(ranked[3].distance.is_some_and(f32::is_nan));
    }

    #[test]
    fn rank_with_zero_k_is_empty() {
        assert!(rank(&[record("a", vec![1.0])], &[1.0], 0).is_empty());
    }
}
