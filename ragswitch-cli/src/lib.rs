//! # ragswitch-cli
//!
//! The `ragswitch` command: an interactive RAG chatbot over a local document
//! folder that can answer with a cloud model (OpenAI) or a local one (Ollama)
//! and switch between them mid-session.
//!
//! Configuration is layered per key: secrets file, then environment (with
//! `.env`), then defaults. See [`settings::Settings`].

pub mod app;
pub mod logging;
pub mod samples;
pub mod settings;
pub mod shell;

pub use app::App;
pub use settings::{EmbeddingBackend, Settings};
