//! Ollama (local) chat provider.
//!
//! Talks to a locally running Ollama server over HTTP and folds its
//! streamed reply into a single answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use ragswitch_model::ollama::{OllamaChatProvider, OllamaConfig};
//!
//! let provider = OllamaChatProvider::new(
//!     OllamaConfig::new("llama3").with_timeout(Duration::from_secs(60)),
//! )?;
//! ```

mod client;
mod config;
mod stream;

pub use client::{LocalModel, OllamaChatProvider};
pub use config::{DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, OllamaConfig, OllamaOptions};
pub use stream::accumulate_stream;
