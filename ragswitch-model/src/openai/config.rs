//! Configuration for the OpenAI chat provider.

use std::time::Duration;

/// The public OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// The default chat model.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";

/// Placeholder shipped in example env files; treated as "no key".
pub const PLACEHOLDER_API_KEY: &str = "your_openai_api_key_here";

/// Connection settings for an OpenAI-compatible chat-completion API.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenAIConfig {
    /// API key; `None` defers the failure to the first `generate` call.
    pub api_key: Option<String>,
    /// Chat model name.
    pub model: String,
    /// API base URL without the trailing `/chat/completions`.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl OpenAIConfig {
    /// Create a config for the public API.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self { api_key: Some(api_key.into()), model: model.into(), ..Default::default() }
    }

    /// Point the provider at another OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The key if it is present and not the template placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }
}
