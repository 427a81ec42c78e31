//! Wires settings into an index, two generation providers and a chatbot.

use std::sync::Arc;

use anyhow::{Context, Result};
use ragswitch_model::ollama::OllamaChatProvider;
use ragswitch_model::openai::OpenAIChatProvider;
use ragswitch_rag::openai::OpenAIEmbeddingProvider;
use ragswitch_rag::{
    EmbeddingProvider, PersistentVectorStore, RagChatbot, TokenChunker, VectorIndex, VectorStore,
    load_documents,
};
use tracing::{info, warn};

use crate::samples::ensure_sample_documents;
use crate::settings::{EmbeddingBackend, Settings};

/// A ready-to-use session.
pub struct App {
    pub settings: Settings,
    pub bot: RagChatbot,
    /// Kept separately for model listing.
    pub local: Arc<OllamaChatProvider>,
    /// The embedding backend in use after fallback.
    pub embedding: EmbeddingBackend,
}

impl App {
    /// Build every component from `settings`.
    ///
    /// With `reset`, the stored collection is dropped before it is opened,
    /// which also recovers from switching to an embedder of another size.
    pub async fn build(settings: Settings, reset: bool) -> Result<Self> {
        let (embedding, warning) = settings.effective_embedding();
        if let Some(warning) = warning {
            warn!("{warning}");
            eprintln!("warning: {warning}");
        }
        let embedder = build_embedder(&settings, embedding)?;

        let index_dir = &settings.index_dir;
        let store = PersistentVectorStore::open(index_dir)
            .with_context(|| format!("failed to open index at {}", index_dir.display()))?;
        let store = Arc::new(store);
        if reset {
            store.delete_collection(&settings.collection_name).await?;
        }

        let index = VectorIndex::new(embedder, store, settings.collection_name.clone())
            .await
            .context(
                "failed to open the vector index \
                 (run `ragswitch ingest --reset` after changing embedders)",
            )?
            .with_batch_size(settings.rag.batch_size)?;
        let index = Arc::new(index);

        let cloud = Arc::new(OpenAIChatProvider::new(settings.openai_config())?);
        let local = Arc::new(OllamaChatProvider::new(settings.ollama_config())?);
        let bot =
            RagChatbot::new(index, cloud, local.clone(), settings.llm_provider, &settings.rag)?;

        Ok(Self { settings, bot, local, embedding })
    }

    /// Chunk and index the documents directory, writing the sample corpus
    /// first if it is empty. Returns `(documents, chunks)` added.
    pub async fn ingest(&self) -> Result<(usize, usize)> {
        let docs_dir = &self.settings.docs_dir;
        if ensure_sample_documents(docs_dir)
            .with_context(|| format!("failed to write sample documents to {}", docs_dir.display()))?
        {
            println!("Created sample documents in {}", docs_dir.display());
        }

        let documents = load_documents(docs_dir)?;
        let chunker = TokenChunker::from_config(&self.settings.rag)?;
        let chunks = chunker.process_documents(&documents);
        self.bot.index().add(&chunks).await?;

        info!(documents = documents.len(), chunks = chunks.len(), "ingested documents");
        Ok((documents.len(), chunks.len()))
    }

    /// Ingest only if the index is empty. Returns the stored chunk count.
    pub async fn ensure_indexed(&self) -> Result<usize> {
        let count = self.bot.index().count().await?;
        if count > 0 {
            return Ok(count);
        }
        let (documents, chunks) = self.ingest().await?;
        println!("Indexed {documents} documents as {chunks} chunks");
        Ok(self.bot.index().count().await?)
    }
}

fn build_embedder(
    settings: &Settings,
    backend: EmbeddingBackend,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match backend {
        EmbeddingBackend::OpenAI => {
            let key = settings.openai_config().usable_api_key().unwrap_or_default().to_string();
            let provider = OpenAIEmbeddingProvider::new(key)?
                .with_model(settings.openai_embedding_model.clone())
                .with_base_url(settings.openai_base_url.clone())
                .with_dimensions(openai_embedding_dimensions(&settings.openai_embedding_model))
                .with_timeout(settings.request_timeout());
            Ok(Arc::new(provider))
        }
        EmbeddingBackend::Local => local_embedder(&settings.local_embedding_model),
    }
}

#[cfg(feature = "local-embeddings")]
fn local_embedder(model: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider = ragswitch_rag::fastembed::FastEmbedProvider::with_model(model)?;
    Ok(Arc::new(provider))
}

#[cfg(not(feature = "local-embeddings"))]
fn local_embedder(model: &str) -> Result<Arc<dyn EmbeddingProvider>> {
    anyhow::bail!(
        "local embedding model '{model}' requested but ragswitch was built \
         without the `local-embeddings` feature"
    )
}

/// Output size of the OpenAI embedding models.
pub fn openai_embedding_dimensions(model: &str) -> usize {
    match model {
        "text-embedding-3-large" => 3072,
        _ => 1536,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_openai_dimensions() {
        assert_eq!(openai_embedding_dimensions("text-embedding-3-small"), 1536);
        assert_eq!(openai_embedding_dimensions("text-embedding-3-large"), 3072);
        assert_eq!(openai_embedding_dimensions("text-embedding-ada-002"), 1536);
    }
}
