//! The provider-agnostic generation contract.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Which backend answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// A remote chat-completion API (OpenAI).
    Cloud,
    /// A locally reachable inference server (Ollama).
    Local,
}

impl LlmProvider {
    /// The canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cloud => "cloud",
            Self::Local => "local",
        }
    }

    /// The other provider.
    pub fn toggled(self) -> Self {
        match self {
            Self::Cloud => Self::Local,
            Self::Local => Self::Cloud,
        }
    }
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LlmProvider {
    type Err = ModelError;

    /// Accepts `cloud`/`openai` and `local`/`ollama`, ignoring case and
    /// surrounding whitespace.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cloud" | "openai" => Ok(Self::Cloud),
            "local" | "ollama" => Ok(Self::Local),
            _ => Err(ModelError::InvalidProvider(s.to_string())),
        }
    }
}

/// A single generation call: one system instruction and one user prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// Instruction sent with the `system` role.
    pub system_prompt: String,
    /// The composed prompt sent with the `user` role.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
}

/// A backend that turns a prompt into text.
///
/// Both the cloud and the local provider implement this trait, so callers
/// can swap backends without knowing which one is active.
///
/// # Example
///
/// ```rust,ignore
/// use ragswitch_model::{GenerationProvider, GenerationRequest};
///
/// let answer = provider.generate(&GenerationRequest {
///     system_prompt: "You are terse.".into(),
///     user_prompt: "Say hi".into(),
///     temperature: 0.2,
///     max_tokens: 16,
/// }).await?;
/// ```
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate a completion for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// The model identifier sent to the backend.
    fn model_name(&self) -> &str;

    /// Which side of the cloud/local switch this provider serves.
    fn kind(&self) -> LlmProvider;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_vendor_names() {
        assert_eq!("cloud".parse::<LlmProvider>().unwrap(), LlmProvider::Cloud);
        assert_eq!("OpenAI".parse::<LlmProvider>().unwrap(), LlmProvider::Cloud);
        assert_eq!(" local ".parse::<LlmProvider>().unwrap(), LlmProvider::Local);
        assert_eq!("ollama".parse::<LlmProvider>().unwrap(), LlmProvider::Local);
    }

    #[test]
    fn rejects_unknown_names() {
        let err = "bogus".parse::<LlmProvider>().unwrap_err();
        assert!(matches!(err, ModelError::InvalidProvider(ref name) if name == "bogus"));
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(LlmProvider::Cloud.toggled(), LlmProvider::Local);
        assert_eq!(LlmProvider::Local.toggled(), LlmProvider::Cloud);
    }
}
