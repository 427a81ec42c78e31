//! OpenAI (cloud) chat-completion provider.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragswitch_model::openai::{OpenAIChatProvider, OpenAIConfig};
//!
//! let provider = OpenAIChatProvider::new(OpenAIConfig::new(
//!     std::env::var("OPENAI_API_KEY").unwrap(),
//!     "gpt-4o-mini",
//! ))?;
//! ```

mod client;
mod config;

pub use client::OpenAIChatProvider;
pub use config::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE, OpenAIConfig, PLACEHOLDER_API_KEY};
