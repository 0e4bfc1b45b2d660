// src/trends/providers/mod.rs
pub mod devto;
pub mod github;
pub mod hackernews;
pub mod rss;

use anyhow::{Context, Result};

/// Where a provider reads its payload from: an embedded fixture or a live URL.
pub(crate) enum Mode {
    Fixture(String),
    Http { url: String, client: reqwest::Client },
}

impl Mode {
    pub(crate) async fn body(&self, provider: &str) -> Result<String> {
        match self {
            Mode::Fixture(s) => Ok(s.clone()),
            Mode::Http { url, client } => {
                let resp = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("{provider} http get()"))?
                    .error_for_status()
                    .with_context(|| format!("{provider} http status"))?;
                resp.text()
                    .await
                    .with_context(|| format!("{provider} http .text()"))
            }
        }
    }
}
