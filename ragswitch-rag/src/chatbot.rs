//! Retrieval-augmented chat over a [`VectorIndex`] with a switchable
//! generation backend.

use std::sync::Arc;

use ragswitch_model::{GenerationProvider, GenerationRequest, LlmProvider};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::RagConfig;
use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::index::VectorIndex;

/// The fixed system instruction sent with every query.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant that answers questions based on provided context.";

/// Context used when retrieval finds nothing.
pub const NO_CONTEXT: &str = "No relevant documents found.";

/// One answered query.
#[derive(Debug, Clone, Serialize)]
pub struct ChatResponse {
    /// The generated answer.
    pub answer: String,
    /// Which backend produced it.
    pub provider: LlmProvider,
    /// The backend's model name.
    pub model_name: String,
    /// Retrieved chunks (verbose only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retrieved_docs: Option<Vec<SearchResult>>,
    /// The formatted context block (verbose only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// The complete user prompt (verbose only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_prompt: Option<String>,
}

/// Format retrieved chunks as numbered, source-labelled sections.
pub fn build_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }
    results
        .iter()
        .enumerate()
        .map(|(i, r)| format!("[Document {} - {}]\n{}", i + 1, r.metadata.source, r.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Compose the user prompt from the context block and the question.
pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful AI assistant. Answer the user's question based on the provided context.

Context:
{context}

Question: {query}

Instructions:
- Answer based primarily on the provided context
- If the context doesn't contain enough information, say so
- Be concise but thorough
- Cite which document sections support your answer when relevant

Answer:"
    )
}

/// A chat session: one index, two generation backends, one active at a time.
///
/// # Example
///
/// ```rust,ignore
/// use ragswitch_rag::RagChatbot;
///
/// let mut bot = RagChatbot::new(index, cloud, local, LlmProvider::Local, &config)?;
/// let reply = bot.chat("What is RAG?", false).await?;
/// bot.switch("openai")?;
/// ```
pub struct RagChatbot {
    index: Arc<VectorIndex>,
    cloud: Arc<dyn GenerationProvider>,
    local: Arc<dyn GenerationProvider>,
    active: LlmProvider,
    n_results: usize,
    temperature: f32,
    max_tokens: u32,
}

impl RagChatbot {
    /// Create a session starting on `initial`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `config.n_results` is zero or a
    /// provider is plugged into the wrong slot.
    pub fn new(
        index: Arc<VectorIndex>,
        cloud: Arc<dyn GenerationProvider>,
        local: Arc<dyn GenerationProvider>,
        initial: LlmProvider,
        config: &RagConfig,
    ) -> Result<Self> {
        if config.n_results == 0 {
            return Err(RagError::ConfigError("n_results must be greater than zero".to_string()));
        }
        if cloud.kind() != LlmProvider::Cloud || local.kind() != LlmProvider::Local {
            return Err(RagError::ConfigError(format!(
                "provider slots mismatched: cloud slot holds {}, local slot holds {}",
                cloud.kind(),
                local.kind()
            )));
        }
        info!(
            provider = %initial,
            model = Self::slot(&cloud, &local, initial).model_name(),
            "chatbot ready"
        );
        Ok(Self {
            index,
            cloud,
            local,
            active: initial,
            n_results: config.n_results,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn slot<'a>(
        cloud: &'a Arc<dyn GenerationProvider>,
        local: &'a Arc<dyn GenerationProvider>,
        which: LlmProvider,
    ) -> &'a Arc<dyn GenerationProvider> {
        match which {
            LlmProvider::Cloud => cloud,
            LlmProvider::Local => local,
        }
    }

    /// The active backend.
    pub fn provider(&self) -> LlmProvider {
        self.active
    }

    /// Model name of the active backend.
    pub fn model_name(&self) -> &str {
        self.active_provider().model_name()
    }

    /// Model name for either backend.
    pub fn model_name_for(&self, which: LlmProvider) -> &str {
        Self::slot(&self.cloud, &self.local, which).model_name()
    }

    /// Number of chunks retrieved per query.
    pub fn n_results(&self) -> usize {
        self.n_results
    }

    /// Sampling temperature.
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Generated-token cap.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// The index queries are answered from.
    pub fn index(&self) -> &Arc<VectorIndex> {
        &self.index
    }

    fn active_provider(&self) -> &Arc<dyn GenerationProvider> {
        Self::slot(&self.cloud, &self.local, self.active)
    }

    /// Switch the active backend by name.
    ///
    /// Accepts `cloud`/`openai` and `local`/`ollama`, case-insensitively.
    /// Switching to the active backend changes nothing.
    ///
    /// # Errors
    ///
    /// Returns a [`RagError::Generation`] wrapping
    /// [`ModelError::InvalidProvider`](ragswitch_model::ModelError::InvalidProvider)
    /// for any other name; the active backend is left unchanged.
    pub fn switch(&mut self, name: &str) -> Result<LlmProvider> {
        let target: LlmProvider = name.parse().inspect_err(|_| {
            warn!(requested = name, current = %self.active, "rejected provider switch");
        })?;
        if target == self.active {
            debug!(provider = %target, "already active");
        } else {
            info!(
                from = %self.active,
                to = %target,
                model = self.model_name_for(target),
                "switched provider"
            );
            self.active = target;
        }
        Ok(target)
    }

    /// Answer `query` from retrieved context with the active backend.
    ///
    /// With `verbose`, the response also carries the retrieved chunks, the
    /// context block and the full prompt.
    ///
    /// # Errors
    ///
    /// Retrieval or generation failures are returned as
    /// [`RagError::ChatError`] holding the query and the original error.
    pub async fn chat(&self, query: &str, verbose: bool) -> Result<ChatResponse> {
        self.answer(query, verbose)
            .await
            .map_err(|e| RagError::ChatError { query: query.to_string(), source: Box::new(e) })
    }

    async fn answer(&self, query: &str, verbose: bool) -> Result<ChatResponse> {
        let results = self.index.search(query, self.n_results).await?;
        let context = build_context(&results);
        let prompt = build_prompt(query, &context);

        let provider = self.active_provider();
        debug!(
            provider = %self.active,
            model = provider.model_name(),
            retrieved = results.len(),
            prompt_len = prompt.len(),
            "generating answer"
        );

        let request = GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: prompt.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };
        let answer = provider.generate(&request).await?;

        Ok(ChatResponse {
            answer,
            provider: self.active,
            model_name: provider.model_name().to_string(),
            retrieved_docs: verbose.then_some(results),
            context: verbose.then_some(context),
            full_prompt: verbose.then_some(prompt),
        })
    }
}

impl std::fmt::Debug for RagChatbot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagChatbot")
            .field("active", &self.active)
            .field("cloud_model", &self.cloud.model_name())
            .field("local_model", &self.local.model_name())
            .field("n_results", &self.n_results)
            .finish_non_exhaustive()
    }
}
