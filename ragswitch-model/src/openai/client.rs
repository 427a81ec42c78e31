//! OpenAI chat-completion client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::config::OpenAIConfig;
use crate::error::{ModelError, Result};
use crate::provider::{GenerationProvider, GenerationRequest, LlmProvider};

const PROVIDER: &str = "OpenAI";

/// Cloud [`GenerationProvider`] backed by the `/chat/completions` endpoint.
///
/// The API key is checked on every call rather than at construction, so a
/// session can start on the local provider and only fail with
/// [`ModelError::Auth`] if the user switches to the cloud without a key.
pub struct OpenAIChatProvider {
    client: reqwest::Client,
    config: OpenAIConfig,
}

impl OpenAIChatProvider {
    /// Create a new provider.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Config`] if the HTTP client cannot be built.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::Config(format!("failed to build OpenAI HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Return the provider configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

// ── OpenAI API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── GenerationProvider implementation ──────────────────────────────

#[async_trait]
impl GenerationProvider for OpenAIChatProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        let api_key = self.config.usable_api_key().ok_or_else(|| ModelError::Auth {
            provider: PROVIDER.into(),
            message: "OPENAI_API_KEY is not set".into(),
        })?;

        debug!(
            provider = PROVIDER,
            model = %self.config.model,
            prompt_len = request.user_prompt.len(),
            "sending chat completion"
        );

        let body = ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage { role: "system", content: &request.system_prompt },
                ChatMessage { role: "user", content: &request.user_prompt },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response =
            self.client.post(self.endpoint()).bearer_auth(api_key).json(&body).send().await.map_err(
                |e| {
                    error!(provider = PROVIDER, error = %e, "request failed");
                    ModelError::provider(PROVIDER, format!("request failed: {e}"))
                },
            )?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = PROVIDER, %status, "API error");
            return Err(ModelError::provider(PROVIDER, format!("API returned {status}: {detail}")));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            ModelError::provider(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ModelError::provider(PROVIDER, "response contained no message content")
            })?;

        info!(
            provider = PROVIDER,
            model = %self.config.model,
            answer_len = answer.len(),
            "completion received"
        );
        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn kind(&self) -> LlmProvider {
        LlmProvider::Cloud
    }
}
