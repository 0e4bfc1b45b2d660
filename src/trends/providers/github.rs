// src/trends/providers/github.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use super::Mode;
use crate::trends::types::{TrendRecord, TrendSource, TrendSourceKind};

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<Repo>,
}

#[derive(Debug, Deserialize)]
struct Repo {
    full_name: String,
    description: Option<String>,
    html_url: String,
    #[serde(default)]
    stargazers_count: u64,
}

/// Repositories created in the last week, most starred first.
pub struct GitHubTrendingProvider {
    mode: Mode,
}

impl GitHubTrendingProvider {
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

    pub fn default_url(today: NaiveDate, per_page: usize) -> String {
        let since = today - chrono::Duration::days(7);
        format!(
            "https://api.github.com/search/repositories?q=created:%3E{}&sort=stars&order=desc&per_page={}",
            since.format("%Y-%m-%d"),
            per_page
        )
    }

    fn parse_items_from_str(s: &str) -> Result<Vec<TrendRecord>> {
        let resp: SearchResponse = serde_json::from_str(s).context("parsing github search json")?;
        let fetched_at = Utc::now();
        Ok(resp
            .items
            .into_iter()
            .map(|r| {
                let title = match r.description.as_deref().map(str::trim) {
                    Some(d) if !d.is_empty() => format!("{}: {}", r.full_name, d),
                    _ => r.full_name,
                };
                TrendRecord {
                    source: TrendSourceKind::RepoTrend,
                    title,
                    url: r.html_url,
                    score: r.stargazers_count as f64,
                    fetched_at,
                }
            })
            .collect())
    }
}

#[async_trait]
impl TrendSource for GitHubTrendingProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &'static str {
        "github"
    }

    fn kind(&self) -> TrendSourceKind {
        TrendSourceKind::RepoTrend
    }
}
