//! Configuration for the Ollama chat provider.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Where a stock Ollama install listens.
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// The default local model.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";

/// Connection and runtime settings for a local Ollama server.
#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    /// Server base URL, e.g. `http://localhost:11434`.
    pub base_url: String,
    /// Model tag as shown by `ollama list`.
    pub model: String,
    /// Deadline for the whole streamed exchange.
    pub timeout: Duration,
    /// Extra runtime options forwarded verbatim.
    pub options: OllamaOptions,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            timeout: Duration::from_secs(120),
            options: OllamaOptions::default(),
        }
    }
}

impl OllamaConfig {
    /// Create a config for `model` on the default local server.
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), ..Default::default() }
    }

    /// Set the server base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the streaming deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set runtime options.
    pub fn with_options(mut self, options: OllamaOptions) -> Self {
        self.options = options;
        self
    }
}

/// Optional Ollama runtime knobs. Unset fields are left to the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaOptions {
    /// Context window size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<u32>,
    /// CPU threads used for inference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_thread: Option<u32>,
    /// Layers offloaded to the GPU; 0 forces CPU.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_gpu: Option<u32>,
}

impl OllamaOptions {
    /// Settings tuned for CPU-only machines: small context, four threads, no GPU.
    pub fn cpu_fast() -> Self {
        Self { num_ctx: Some(2048), num_thread: Some(4), num_gpu: Some(0) }
    }
}
