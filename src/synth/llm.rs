// src/synth/llm.rs
//! Generative text providers: one request, one response, no streaming.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{LlmProvider, LlmSettings};
use crate::error::GenerationError;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const ERROR_BODY_MAX_CHARS: usize = 500;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
    /// Provider name for diagnostics.
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Build the configured provider. Fails only if the HTTP client can't be built.
pub fn build_generator(settings: &LlmSettings) -> Result<DynGenerator, GenerationError> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("blog-autodraft/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(std::time::Duration::from_secs(5))
        .timeout(settings.timeout)
        .build()
        .map_err(|e| GenerationError::Transport(e.to_string()))?;

    let generator: DynGenerator = match settings.provider {
        LlmProvider::Anthropic => Arc::new(AnthropicGenerator::new(http, settings.clone())),
        LlmProvider::OpenAi => Arc::new(OpenAiGenerator::new(http, settings.clone())),
    };
    Ok(generator)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max).collect();
        out.push('…');
        out
    }
}

/// Send a prepared request and decode the JSON envelope. Non-2xx statuses and
/// undecodable bodies become `GenerationError`s.
async fn send_json<T: for<'de> Deserialize<'de>>(
    req: reqwest::RequestBuilder,
) -> Result<T, GenerationError> {
    let resp = req
        .send()
        .await
        .map_err(|e| GenerationError::Transport(e.to_string()))?;

    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| GenerationError::Transport(e.to_string()))?;

    if !status.is_success() {
        return Err(GenerationError::Upstream {
            status: status.as_u16(),
            body: truncate_chars(text.trim(), ERROR_BODY_MAX_CHARS),
        });
    }

    serde_json::from_str(&text).map_err(|e| GenerationError::Envelope(e.to_string()))
}

// ------------------------------------------------------------
// Anthropic Messages API
// ------------------------------------------------------------

pub struct AnthropicGenerator {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl AnthropicGenerator {
    pub fn new(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct AnthropicReq<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Msg<'a>>,
}

#[derive(Deserialize)]
struct AnthropicResp {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = AnthropicReq {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let body: AnthropicResp = send_json(
            self.http
                .post(format!("{}/v1/messages", self.settings.base_url))
                .header("x-api-key", &self.settings.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&req),
        )
        .await?;

        let text: String = body
            .content
            .into_iter()
            .filter(|b| b.kind == "text")
            .filter_map(|b| b.text)
            .collect();
        if text.trim().is_empty() {
            return Err(GenerationError::Envelope("response has no text content".into()));
        }
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

// ------------------------------------------------------------
// OpenAI Chat Completions API
// ------------------------------------------------------------

pub struct OpenAiGenerator {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl OpenAiGenerator {
    pub fn new(http: reqwest::Client, settings: LlmSettings) -> Self {
        Self { http, settings }
    }
}

#[derive(Serialize)]
struct OpenAiReq<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAiResp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let req = OpenAiReq {
            model: &self.settings.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.settings.max_tokens,
        };

        let body: OpenAiResp = send_json(
            self.http
                .post(format!("{}/v1/chat/completions", self.settings.base_url))
                .bearer_auth(&self.settings.api_key)
                .json(&req),
        )
        .await?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| GenerationError::Envelope("response has no message content".into()))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ------------------------------------------------------------
// Fixed output (tests, offline runs)
// ------------------------------------------------------------

/// Returns the same text for every prompt and remembers the prompts it saw.
pub struct StaticGenerator {
    pub fixed: String,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl StaticGenerator {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for StaticGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        Ok(self.fixed.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
