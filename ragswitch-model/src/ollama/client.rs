//! Ollama chat client.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::{OllamaConfig, OllamaOptions};
use super::stream::accumulate_stream;
use crate::error::{ModelError, Result};
use crate::provider::{GenerationProvider, GenerationRequest, LlmProvider};

const PROVIDER: &str = "Ollama";

/// Local [`GenerationProvider`] backed by an Ollama server's `/api/chat`.
///
/// Requests are always streamed; the fragments are folded into a single
/// answer by [`accumulate_stream`]. The configured timeout bounds the whole
/// exchange, from connect to the terminal fragment.
pub struct OllamaChatProvider {
    client: reqwest::Client,
    config: OllamaConfig,
}

impl OllamaChatProvider {
    /// Create a new provider. No connection is made until the first call.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build Ollama HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Return the provider configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// List the models installed on the server (`GET /api/tags`).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Provider`] if the server is unreachable or
    /// answers with an unexpected body, and [`ModelError::Timeout`] if it
    /// does not answer within the configured deadline.
    pub async fn list_models(&self) -> Result<Vec<LocalModel>> {
        let started = Instant::now();
        let request = async {
            let response = self.client.get(self.url("/api/tags")).send().await.map_err(|e| {
                let message = format!("failed to reach {}: {e}", self.config.base_url);
                ModelError::provider(PROVIDER, message)
            })?;
            let response = check_status(response).await?;
            response.json::<TagsResponse>().await.map_err(|e| {
                ModelError::provider(PROVIDER, format!("failed to parse model list: {e}"))
            })
        };

        let tags = tokio::time::timeout(self.config.timeout, request)
            .await
            .map_err(|_| ModelError::Timeout {
                provider: PROVIDER.into(),
                elapsed: started.elapsed(),
            })??;
        Ok(tags.models)
    }

    async fn stream_chat(&self, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
            stream: true,
            options: RequestOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
                runtime: &self.config.options,
            },
        };

        let response =
            self.client.post(self.url("/api/chat")).json(&body).send().await.map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                ModelError::provider(PROVIDER, format!("error calling Ollama: {e}"))
            })?;
        let response = check_status(response).await?;

        accumulate_stream(response.bytes_stream()).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    error!(provider = PROVIDER, %status, "API error");
    Err(ModelError::provider(PROVIDER, format!("Ollama API error: {status} - {body}")))
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: RequestOptions<'a>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestOptions<'a> {
    temperature: f32,
    num_predict: u32,
    #[serde(flatten)]
    runtime: &'a OllamaOptions,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<LocalModel>,
}

/// A model installed on the local server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalModel {
    /// Model tag, e.g. `llama3:latest`.
    pub name: String,
    /// Size on disk in bytes.
    #[serde(default)]
    pub size: u64,
    /// Last modification timestamp as reported by the server.
    #[serde(default)]
    pub modified_at: String,
}

// ── GenerationProvider implementation ──────────────────────────────

#[async_trait]
impl GenerationProvider for OllamaChatProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.config.model,
            base_url = %self.config.base_url,
            prompt_len = request.user_prompt.len(),
            "streaming chat"
        );

        let started = Instant::now();
        let answer = tokio::time::timeout(self.config.timeout, self.stream_chat(request))
            .await
            .map_err(|_| {
                let elapsed = started.elapsed();
                error!(
                    provider = PROVIDER,
                    elapsed_secs = elapsed.as_secs(),
                    "generation timed out"
                );
                ModelError::Timeout { provider: PROVIDER.into(), elapsed }
            })??;

        info!(
            provider = PROVIDER,
            model = %self.config.model,
            answer_len = answer.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> LlmProvider {
        LlmProvider::Local
    }
}
