// src/trends/providers/devto.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::Mode;
use crate::trends::types::{TrendRecord, TrendSource, TrendSourceKind};

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    url: String,
    #[serde(default)]
    public_reactions_count: u64,
}

/// Top dev.to articles of the last day.
pub struct DevToProvider {
    mode: Mode,
}

impl DevToProvider {
    pub fn from_fixture_str(s: &str) -> Self {
        Self {
            mode: Mode::Fixture(s.to_string()),
        }
    }

    pub fn from_url(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            mode: Mode::Http {
                url: url.into(),
                client,
            },
        }
    }

    pub fn default_url(per_page: usize) -> String {
        format!("https://dev.to/api/articles?top=1&per_page={per_page}")
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<TrendRecord>> {
        let items: Vec<Article> = serde_json::from_str(s).context("parsing dev.to articles json")?;
        let fetched_at = Utc::now();
        Ok(items
            .into_iter()
            .map(|a| TrendRecord {
                source: TrendSourceKind::Article,
                title: a.title,
                url: a.url,
                score: a.public_reactions_count as f64,
                fetched_at,
            })
            .collect())
    }
}

#[async_trait]
impl TrendSource for DevToProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &'static str {
        "devto"
    }

    fn kind(&self) -> TrendSourceKind {
        TrendSourceKind::Article
    }
}
