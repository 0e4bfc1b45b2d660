// src/trends/providers/rss.rs
use std::borrow::Cow;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use once_cell::sync::OnceCell;
use quick_xml::de::from_str;
use regex::{Captures, Regex};
use serde::Deserialize;

use super::Mode;
use crate::trends::types::{TrendRecord, TrendSource, TrendSourceKind};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Generic RSS 2.0 feed. RSS has no engagement signal, so the score is the
/// item's rank from the top of the feed (first item = highest).
pub struct RssFeedProvider {
    mode: Mode,
}

impl RssFeedProvider {
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

    fn parse_items_from_str(s: &str) -> Result<Vec<TrendRecord>> {
        let xml_clean = decode_html_entities_for_xml(s);
        let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;
        let fetched_at = Utc::now();

        let items: Vec<(String, String)> = rss
            .channel
            .item
            .into_iter()
            .filter_map(|it| Some((it.title?, it.link?)))
            .collect();
        let n = items.len();

        Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, (title, url))| TrendRecord {
                source: TrendSourceKind::Article,
                title,
                url: url.trim().to_string(),
                score: (n - i) as f64,
                fetched_at,
            })
            .collect())
    }
}

#[async_trait]
impl TrendSource for RssFeedProvider {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>> {
        let body = self.mode.body(self.name()).await?;
        Self::parse_items_from_str(&body)
    }

    fn name(&self) -> &'static str {
        "rss"
    }

    fn kind(&self) -> TrendSourceKind {
        TrendSourceKind::Article
    }
}

/// quick-xml only knows the five XML entities. Decode every other named
/// entity up front, re-escaping anything that would break the markup.
fn decode_html_entities_for_xml(s: &str) -> Cow<'_, str> {
    static NAMED_ENTITY: OnceCell<Regex> = OnceCell::new();
    let re = NAMED_ENTITY.get_or_init(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());
    re.replace_all(s, |caps: &Captures| match &caps[1] {
        "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
        _ => {
            let decoded = html_escape::decode_html_entities(&caps[0]);
            if decoded == caps[0] {
                // Unknown entity; leave it for the XML parser to reject.
                caps[0].to_string()
            } else {
                html_escape::encode_text(&decoded).into_owned()
            }
        }
    })
}
