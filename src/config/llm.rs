// src/config/llm.rs
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

fn default_provider() -> String {
    "anthropic".to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_timeout_secs() -> u64 {
    90
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// "anthropic" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Provider default when absent.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Override the API host (tests, proxies).
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Anthropic,
    OpenAi,
}

impl LlmProvider {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" => Ok(Self::OpenAi),
            other => Err(ConfigError::UnsupportedProvider(other.to_string())),
        }
    }

    pub fn key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => ENV_ANTHROPIC_API_KEY,
            Self::OpenAi => ENV_OPENAI_API_KEY,
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-5",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com",
        }
    }
}

/// Fully resolved generator settings, credential included.
#[derive(Clone)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

// Never print the key itself.
impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("provider", &self.provider)
            .field("key_len", &self.api_key.len())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl LlmConfig {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<LlmSettings, ConfigError> {
        self.resolve_with(|k| std::env::var(k).ok())
    }

    /// Resolve with an injected env lookup. A missing or blank key is fatal.
    pub fn resolve_with<F>(&self, lookup: F) -> Result<LlmSettings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = LlmProvider::parse(&self.provider)?;
        let api_key = lookup(provider.key_env())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingCredential(provider.key_env()))?;

        let model = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model())
            .to_string();
        let base_url = self
            .base_url
            .as_deref()
            .unwrap_or(provider.default_base_url())
            .trim_end_matches('/')
            .to_string();

        Ok(LlmSettings {
            provider,
            api_key,
            model,
            max_tokens: self.max_tokens.max(1),
            timeout: Duration::from_secs(self.timeout_secs.max(1)),
            base_url,
        })
    }
}
