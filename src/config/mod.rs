// src/config/mod.rs
//! Run configuration: optional TOML file + environment overrides.

pub mod llm;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::seq::IndexedRandom;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::synth::types::StyleParams;

pub use llm::{LlmConfig, LlmProvider, LlmSettings};

// --- env defaults & names ---
pub const DEFAULT_CONFIG_PATH: &str = "config/autodraft.toml";
pub const DEFAULT_CONTENT_DIR: &str = "src/content/blog";

pub const ENV_CONFIG_PATH: &str = "AUTODRAFT_CONFIG_PATH";
pub const ENV_CONTENT_DIR: &str = "AUTODRAFT_CONTENT_DIR";
pub const ENV_TOPIC: &str = "BLOG_TOPIC";

const DEFAULT_TOPICS: &[&str] = &[
    "Laravel Performance Tips",
    "Modern PHP Features Every Developer Should Know",
    "Building REST APIs the Boring Way",
    "TypeScript Patterns for Large Codebases",
    "Docker for Local Development",
    "What Actually Makes a Good Code Review",
    "Practical Web Performance Wins",
    "Getting Started with Rust as a Web Developer",
    "Database Indexing Explained Simply",
    "AI Tools in the Everyday Developer Workflow",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub sources: SourcesConfig,
    pub style: StyleParams,
    pub topics: Vec<String>,
    pub content_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            sources: SourcesConfig::default(),
            style: StyleParams::default(),
            topics: DEFAULT_TOPICS.iter().map(|s| s.to_string()).collect(),
            content_dir: PathBuf::from(DEFAULT_CONTENT_DIR),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub github: bool,
    pub hackernews: bool,
    pub devto: bool,
    pub rss_feeds: Vec<String>,
    pub max_per_source: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            github: true,
            hackernews: true,
            devto: true,
            rss_feeds: Vec::new(),
            max_per_source: 10,
            timeout_secs: 12,
            user_agent: concat!("blog-autodraft/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl AppConfig {
    /// Load config from an explicit TOML path. Environment overrides apply
    /// on top of the file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.clean();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    /// Load config using env var + fallbacks:
    /// 1) $AUTODRAFT_CONFIG_PATH (must exist)
    /// 2) config/autodraft.toml
    /// 3) built-in defaults
    ///
    /// `$AUTODRAFT_CONTENT_DIR` overrides `content_dir` in every case.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            Self::load_from(Path::new(&p))
        } else {
            let p = Path::new(DEFAULT_CONFIG_PATH);
            if p.exists() {
                Self::load_from(p)
            } else {
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                Ok(cfg)
            }
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var(ENV_CONTENT_DIR) {
            if !dir.trim().is_empty() {
                self.content_dir = PathBuf::from(dir.trim());
            }
        }
    }

    fn clean(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.topics = std::mem::take(&mut self.topics)
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect();
        self.sources.rss_feeds.retain(|u| !u.trim().is_empty());
    }
}

/// Pick the topic for this run: explicit value, then `$BLOG_TOPIC`, then a
/// random entry from `topics`.
pub fn resolve_topic(explicit: Option<&str>, topics: &[String]) -> Result<String, ConfigError> {
    let env_topic = std::env::var(ENV_TOPIC).ok();
    choose_topic(
        explicit.or(env_topic.as_deref()),
        topics,
        &mut rand::rng(),
    )
}

pub fn choose_topic<R: rand::Rng + ?Sized>(
    explicit: Option<&str>,
    topics: &[String],
    rng: &mut R,
) -> Result<String, ConfigError> {
    if let Some(t) = explicit.map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(t.to_string());
    }
    topics.choose(rng).cloned().ok_or(ConfigError::NoTopics)
}
