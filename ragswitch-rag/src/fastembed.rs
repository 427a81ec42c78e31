//! Local sentence-embedding provider backed by `fastembed`.
//!
//! This module is only available when the `local-embeddings` feature is
//! enabled. Model weights are fetched into the `fastembed` cache on first use
//! and inference runs on tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::{debug, error, info};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

const PROVIDER: &str = "fastembed";

/// The default local model.
pub const DEFAULT_LOCAL_MODEL: &str = "all-MiniLM-L6-v2";

/// Resolve a model name to a `fastembed` model and its output dimensionality.
///
/// Accepts both bare names and `sentence-transformers/`/`BAAI/` prefixed
/// names, case-insensitively.
fn resolve_model(name: &str) -> Option<(EmbeddingModel, usize)> {
    let bare = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
    match bare.as_str() {
        "all-minilm-l6-v2" => Some((EmbeddingModel::AllMiniLML6V2, 384)),
        "all-minilm-l12-v2" => Some((EmbeddingModel::AllMiniLML12V2, 384)),
        "bge-small-en-v1.5" => Some((EmbeddingModel::BGESmallENV15, 384)),
        "bge-base-en-v1.5" => Some((EmbeddingModel::BGEBaseENV15, 768)),
        _ => None,
    }
}

/// An in-process [`EmbeddingProvider`] running a pretrained sentence model.
pub struct FastEmbedProvider {
    model: Arc<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load the default model (`all-MiniLM-L6-v2`).
    pub fn new() -> Result<Self> {
        Self::with_model(DEFAULT_LOCAL_MODEL)
    }

    /// Load the named model.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ModelLoadError`] if the name is unknown or the
    /// weights cannot be downloaded or initialised.
    pub fn with_model(name: &str) -> Result<Self> {
        let (model, dimensions) = resolve_model(name).ok_or_else(|| RagError::ModelLoadError {
            model: name.to_string(),
            message: "unsupported local embedding model".to_string(),
        })?;

        let embedding = TextEmbedding::try_new(InitOptions::new(model)).map_err(|e| {
            error!(provider = PROVIDER, model = name, error = %e, "failed to load model");
            RagError::ModelLoadError { model: name.to_string(), message: e.to_string() }
        })?;

        info!(provider = PROVIDER, model = name, dimensions, "loaded embedding model");
        Ok(Self { model: Arc::new(embedding), model_name: name.to_string(), dimensions })
    }
}

impl std::fmt::Debug for FastEmbedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastEmbedProvider")
            .field("model_name", &self.model_name)
            .field("dimensions", &self.dimensions)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let results = self.embed_batch(&[text]).await?;
        results.into_iter().next().ok_or_else(|| RagError::ProviderError {
            provider: PROVIDER.into(),
            message: "model returned no embedding".into(),
        })
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            provider = PROVIDER,
            batch_size = texts.len(),
            model = %self.model_name,
            "embedding batch"
        );

        let model = Arc::clone(&self.model);
        let owned: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        tokio::task::spawn_blocking(move || model.embed(owned, None))
            .await
            .map_err(|e| RagError::ProviderError {
                provider: PROVIDER.into(),
                message: format!("embedding task failed: {e}"),
            })?
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "inference failed");
                RagError::ProviderError { provider: PROVIDER.into(), message: e.to_string() }
            })
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
