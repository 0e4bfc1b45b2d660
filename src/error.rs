// src/error.rs
//! Error taxonomy for the pipeline.
//!
//! Source fetch failures never show up here: sources return `anyhow::Error`
//! and the aggregator swallows them. Everything below is fatal for a run.

use std::path::PathBuf;

/// Fatal configuration problems, raised before any network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing credential: set the {0} environment variable")]
    MissingCredential(&'static str),

    #[error("unsupported llm provider `{0}` (expected `anthropic` or `openai`)")]
    UnsupportedProvider(String),

    #[error("reading config from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("no topics configured and no topic override given")]
    NoTopics,
}

/// Upstream API failure or a response that cannot become a `GeneratedPost`.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generative api request failed: {0}")]
    Transport(String),

    #[error("generative api returned HTTP {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed api envelope: {0}")]
    Envelope(String),

    #[error("response has no frontmatter block delimited by `---`")]
    MissingFrontmatter,

    #[error("malformed frontmatter line {line}: {reason}")]
    Syntax { line: usize, reason: String },

    #[error("frontmatter field `{0}` is missing")]
    MissingField(&'static str),

    #[error("frontmatter field `{field}` is invalid: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("generated post has an empty body")]
    EmptyBody,
}

/// Filesystem failures while persisting a post. Always carries the path.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("creating content directory {}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing post to {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no free filename left for {}", path.display())]
    Exhausted { path: PathBuf },
}

impl PersistenceError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::CreateDir { path, .. } | Self::Write { path, .. } | Self::Exhausted { path } => {
                path
            }
        }
    }
}
