//! # ragswitch-model
//!
//! Text generation backends for ragswitch.
//!
//! ## Overview
//!
//! Two providers implement the same [`GenerationProvider`] trait:
//!
//! - [`OpenAIChatProvider`] - cloud chat completions (GPT-3.5, GPT-4o, ...)
//! - [`OllamaChatProvider`] - a local Ollama server, streamed
//!
//! Callers pick one through [`LlmProvider`] and never branch on the
//! concrete type.
//!
//! ## Quick Start
//!
//! ### Cloud
//!
//! ```rust,ignore
//! use ragswitch_model::openai::{OpenAIChatProvider, OpenAIConfig};
//!
//! let cloud = OpenAIChatProvider::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY").unwrap(),
//!     "gpt-3.5-turbo",
//! ))?;
//! ```
//!
//! ### Local
//!
//! ```rust,ignore
//! use ragswitch_model::ollama::{OllamaChatProvider, OllamaConfig};
//!
//! let local = OllamaChatProvider::new(OllamaConfig::new("llama3"))?;
//! ```
//!
//! ## Errors
//!
//! | Variant | When |
//! |---------|------|
//! | [`ModelError::Auth`] | cloud call without an API key |
//! | [`ModelError::Provider`] | transport, HTTP status, or malformed body |
//! | [`ModelError::Timeout`] | local stream did not finish in time |
//! | [`ModelError::InvalidProvider`] | unknown provider name |

pub mod error;
pub mod ollama;
pub mod openai;
pub mod provider;

pub use error::{ModelError, Result};
pub use ollama::{OllamaChatProvider, OllamaConfig, OllamaOptions};
pub use openai::{OpenAIChatProvider, OpenAIConfig};
pub use provider::{GenerationProvider, GenerationRequest, LlmProvider};
