//! Layered configuration.
//!
//! Every key is resolved independently: the secrets file wins over the
//! environment, which wins over the built-in default. The environment is
//! seeded from `.env`, or from `config.env.example` when there is no `.env`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ragswitch_model::ollama::{
    DEFAULT_OLLAMA_BASE_URL, DEFAULT_OLLAMA_MODEL, OllamaConfig, OllamaOptions,
};
use ragswitch_model::openai::{DEFAULT_CHAT_MODEL, OPENAI_API_BASE, OpenAIConfig};
use ragswitch_model::LlmProvider;
use ragswitch_rag::{RagConfig, RagError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Where embeddings are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// In-process sentence model.
    Local,
    /// OpenAI embeddings API.
    OpenAI,
}

impl FromStr for EmbeddingBackend {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "sentence-transformers" | "fastembed" => Ok(Self::Local),
            "openai" => Ok(Self::OpenAI),
            other => Err(RagError::ConfigError(format!(
                "unknown embedding provider '{other}', expected 'local' or 'openai'"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::OpenAI => "openai",
        })
    }
}

/// Raw key/value sources, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct Layers {
    /// Values from the secrets file, keyed by upper-case name.
    pub secrets: HashMap<String, String>,
    /// Process environment after `.env` loading.
    pub env: HashMap<String, String>,
}

impl Layers {
    /// The first non-blank value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        [&self.secrets, &self.env]
            .into_iter()
            .filter_map(|layer| layer.get(key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key) {
            Some(raw) => raw.parse().map_err(|e| {
                RagError::ConfigError(format!("invalid value for {key} ({raw:?}): {e}"))
            }),
            None => Ok(default),
        }
    }
}

/// Resolved application settings.
#[derive(Clone, Serialize)]
pub struct Settings {
    pub llm_provider: LlmProvider,
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub openai_embedding_model: String,
    pub embedding_provider: EmbeddingBackend,
    pub local_embedding_model: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_options: OllamaOptions,
    pub index_dir: PathBuf,
    pub collection_name: String,
    pub docs_dir: PathBuf,
    pub rag: RagConfig,
    pub request_timeout_secs: u64,
    /// Whether the fast CPU profile was applied.
    pub fast: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Local,
            openai_api_key: None,
            openai_model: DEFAULT_CHAT_MODEL.to_string(),
            openai_base_url: OPENAI_API_BASE.to_string(),
            openai_embedding_model: "text-embedding-3-small".to_string(),
            embedding_provider: EmbeddingBackend::Local,
            local_embedding_model: "all-MiniLM-L6-v2".to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_options: OllamaOptions::default(),
            index_dir: PathBuf::from("./chroma_db"),
            collection_name: "rag_documents".to_string(),
            docs_dir: PathBuf::from("./sample_docs"),
            rag: RagConfig::default(),
            request_timeout_secs: 120,
            fast: false,
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("llm_provider", &self.llm_provider)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("openai_model", &self.openai_model)
            .field("embedding_provider", &self.embedding_provider)
            .field("ollama_model", &self.ollama_model)
            .field("index_dir", &self.index_dir)
            .field("rag", &self.rag)
            .field("fast", &self.fast)
            .finish_non_exhaustive()
    }
}

impl Settings {
    /// Resolve every key from `layers`, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for values that do not parse.
    pub fn resolve(layers: &Layers) -> Result<Self> {
        let d = Self::default();
        let index_dir = layers
            .get("INDEX_DIR")
            .or_else(|| layers.get("CHROMA_PERSIST_DIR"))
            .map_or(d.index_dir, PathBuf::from);

        Ok(Self {
            llm_provider: layers.parse("LLM_PROVIDER", d.llm_provider)?,
            openai_api_key: layers.get("OPENAI_API_KEY").map(str::to_string),
            openai_model: layers.string("OPENAI_MODEL", &d.openai_model),
            openai_base_url: layers.string("OPENAI_BASE_URL", &d.openai_base_url),
            openai_embedding_model: layers
                .string("OPENAI_EMBEDDING_MODEL", &d.openai_embedding_model),
            embedding_provider: layers.parse("EMBEDDING_PROVIDER", d.embedding_provider)?,
            local_embedding_model: layers.string("LOCAL_EMBEDDING_MODEL", &d.local_embedding_model),
            ollama_base_url: layers.string("OLLAMA_BASE_URL", &d.ollama_base_url),
            ollama_model: layers.string("OLLAMA_MODEL", &d.ollama_model),
            ollama_options: d.ollama_options,
            index_dir,
            collection_name: layers.string("COLLECTION_NAME", &d.collection_name),
            docs_dir: layers.get("DOCS_DIR").map_or(d.docs_dir, PathBuf::from),
            rag: RagConfig {
                chunk_size: layers.parse("CHUNK_SIZE", d.rag.chunk_size)?,
                chunk_overlap: layers.parse("CHUNK_OVERLAP", d.rag.chunk_overlap)?,
                n_results: layers.parse("N_RESULTS", d.rag.n_results)?,
                batch_size: layers.parse("BATCH_SIZE", d.rag.batch_size)?,
                temperature: layers.parse("TEMPERATURE", d.rag.temperature)?,
                max_tokens: layers.parse("MAX_TOKENS", d.rag.max_tokens)?,
            },
            request_timeout_secs: layers.parse("REQUEST_TIMEOUT_SECS", d.request_timeout_secs)?,
            fast: false,
        })
    }

    /// Load `.env`, read the secrets file and resolve.
    ///
    /// `secrets_path` overrides the default `~/.config/ragswitch/secrets.toml`.
    /// A missing default secrets file is fine; a missing explicit one is not.
    pub fn load(secrets_path: Option<&Path>) -> Result<Self> {
        if let Some(env_file) = load_env_file() {
            info!(file = %env_file.display(), "loaded environment file");
        }

        let secrets = match secrets_path {
            Some(path) => read_secrets(path)?,
            None => match default_secrets_path() {
                Some(path) if path.is_file() => read_secrets(&path)?,
                _ => HashMap::new(),
            },
        };

        let layers = Layers { secrets, env: std::env::vars().collect() };
        Self::resolve(&layers)
    }

    /// Switch to the CPU-friendly profile: smaller chunks, one retrieved
    /// chunk, shorter and cooler answers, reduced Ollama context.
    pub fn apply_fast_profile(&mut self) {
        self.rag.chunk_size = 300;
        self.rag.chunk_overlap = 25;
        self.rag.n_results = 1;
        self.rag.temperature = 0.3;
        self.rag.max_tokens = 200;
        self.ollama_options = OllamaOptions::cpu_fast();
        self.fast = true;
    }

    /// Check the resolved values for consistency.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] for invalid chunking or retrieval
    /// values, or when the cloud provider is selected without a usable key.
    pub fn validate(&self) -> Result<()> {
        self.rag.validate()?;
        if self.request_timeout_secs == 0 {
            return Err(RagError::ConfigError(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.llm_provider == LlmProvider::Cloud && !self.has_openai_key() {
            return Err(RagError::ConfigError(
                "llm_provider is 'cloud' but OPENAI_API_KEY is missing or still the placeholder"
                    .into(),
            ));
        }
        Ok(())
    }

    /// The embedding backend to actually use, and a warning when the
    /// configured one had to be replaced.
    pub fn effective_embedding(&self) -> (EmbeddingBackend, Option<String>) {
        match self.embedding_provider {
            EmbeddingBackend::OpenAI if self.openai_config().usable_api_key().is_none() => (
                EmbeddingBackend::Local,
                Some(
                    "EMBEDDING_PROVIDER is 'openai' but no API key is set, using local embeddings"
                        .into(),
                ),
            ),
            other => (other, None),
        }
    }

    /// Whether a usable OpenAI key is configured.
    pub fn has_openai_key(&self) -> bool {
        self.openai_config().usable_api_key().is_some()
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Connection settings for the cloud provider.
    pub fn openai_config(&self) -> OpenAIConfig {
        OpenAIConfig {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
            timeout: self.request_timeout(),
        }
    }

    /// Connection settings for the local provider.
    pub fn ollama_config(&self) -> OllamaConfig {
        OllamaConfig::new(self.ollama_model.clone())
            .with_base_url(self.ollama_base_url.clone())
            .with_timeout(self.request_timeout())
            .with_options(self.ollama_options.clone())
    }
}

/// `~/.config/ragswitch/secrets.toml` (platform equivalent elsewhere).
pub fn default_secrets_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "ragswitch").map(|d| d.config_dir().join("secrets.toml"))
}

/// Load `.env`, or `config.env.example` if there is no `.env`. Existing
/// environment variables are never overwritten.
fn load_env_file() -> Option<PathBuf> {
    [".env", "config.env.example"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.is_file())
        .and_then(|path| dotenvy::from_path(&path).ok().map(|()| path))
}

/// Read a flat TOML table into upper-case keys with string values.
pub fn read_secrets(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path)?;
    let secrets = parse_secrets(&content).map_err(|e| {
        RagError::ConfigError(format!("invalid secrets file {}: {e}", path.display()))
    })?;
    debug!(file = %path.display(), keys = secrets.len(), "read secrets file");
    Ok(secrets)
}

fn parse_secrets(content: &str) -> std::result::Result<HashMap<String, String>, toml::de::Error> {
    let table: toml::Table = toml::from_str(content)?;
    Ok(table
        .into_iter()
        .filter_map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => return None,
            };
            Some((key.to_ascii_uppercase(), value))
        })
        .collect())
}
