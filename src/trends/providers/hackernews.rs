// src/trends/providers/hackernews.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

use super::Mode;
use crate::trends::types::{TrendRecord, TrendSource, TrendSourceKind};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    title: Option<String>,
    url: Option<String>,
    #[serde(default)]
    points: Option<u64>,
    #[serde(rename = "objectID")]
    object_id: String,
}

/// Hacker News front page via the Algolia search API.
pub struct HackerNewsProvider {
    mode: Mode,
}

impl HackerNewsProvider {
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

    pub fn default_url(hits: usize) -> String {
        format!("https://hn.algolia.com/api/v1/search?tags=front_page&hitsPerPage={hits}")
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<TrendRecord>> {
        let resp: SearchResponse = serde_json::from_str(s).context("parsing hn search json")?;
        let fetched_at = Utc::now();
        Ok(resp
            .hits
            .into_iter()
            .filter_map(|h| {
                let title = h.title?;
                // Ask/Show HN posts have no external link.
                let url = h
                    .url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", h.object_id));
                Some(TrendRecord {
                    source: TrendSourceKind::ForumPost,
                    title,
                    url,
                    score: h.points.unwrap_or(0) as f64,
                    fetched_at,
                })
            })
            .collect())
    }
}

#[async_trait]
impl TrendSource for HackerNewsProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &'static str {
        "hackernews"
    }

    fn kind(&self) -> TrendSourceKind {
        TrendSourceKind::ForumPost
    }
}
