//! Error types for the `ragswitch-model` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while generating text.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No usable credential is configured for a provider that needs one.
    #[error("Authentication error ({provider}): {message}")]
    Auth {
        /// The provider that rejected the call.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A transport, HTTP, or response-format failure.
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The provider did not signal completion before the deadline.
    #[error("{provider} request timed out after {}s. Is the model loaded?", elapsed.as_secs())]
    Timeout {
        /// The provider that timed out.
        provider: String,
        /// How long the caller waited.
        elapsed: Duration,
    },

    /// A provider name that is neither cloud nor local.
    #[error("Invalid provider: {0}. Must be 'cloud' (openai) or 'local' (ollama)")]
    InvalidProvider(String),

    /// Invalid provider configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ModelError {
    pub(crate) fn provider(provider: &str, message: impl Into<String>) -> Self {
        Self::Provider { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for generation operations.
pub type Result<T> = std::result::Result<T, ModelError>;
