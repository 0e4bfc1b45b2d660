// src/trends/types.rs
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum TrendSourceKind {
    RepoTrend,
    ForumPost,
    Article,
}

impl TrendSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepoTrend => "repo-trend",
            Self::ForumPost => "forum-post",
            Self::Article => "article",
        }
    }
}

impl std::fmt::Display for TrendSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized signal. `score` only ranks within its own source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrendRecord {
    pub source: TrendSourceKind,
    pub title: String,
    pub url: String,
    pub score: f64,
    pub fetched_at: DateTime<Utc>,
}

/// Records of a single registered source. A failed source has no records and
/// keeps the logged error message for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceGroup {
    pub name: String,
    pub kind: TrendSourceKind,
    pub records: Vec<TrendRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceGroup {
    pub fn empty(name: &str, kind: TrendSourceKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            records: Vec::new(),
            error: None,
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Groups in source registration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendBatch {
    pub groups: Vec<SourceGroup>,
}

impl TrendBatch {
    pub fn new(groups: Vec<SourceGroup>) -> Self {
        Self { groups }
    }

    pub fn total_records(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// True when no group carries a record (every source failed or was empty).
    pub fn is_empty(&self) -> bool {
        self.total_records() == 0
    }

    pub fn populated_sources(&self) -> Vec<&str> {
        self.groups
            .iter()
            .filter(|g| !g.records.is_empty())
            .map(|g| g.name.as_str())
            .collect()
    }

    pub fn group(&self, name: &str) -> Option<&SourceGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// JSON-like listing used inside the generation prompt. Empty groups are
    /// skipped; a batch with no records renders as an empty string.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::new();
        for g in self.groups.iter().filter(|g| !g.records.is_empty()) {
            out.push_str(&format!("source: {} ({})\n", g.name, g.kind));
            out.push_str("[\n");
            for r in &g.records {
                out.push_str(&format!(
                    "  {{ \"title\": {}, \"url\": {}, \"score\": {} }},\n",
                    json_str(&r.title),
                    json_str(&r.url),
                    fmt_score(r.score)
                ));
            }
            out.push_str("]\n");
        }
        out
    }
}

fn json_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| format!("\"{}\"", s.replace('"', "'")))
}

fn fmt_score(score: f64) -> String {
    if score.fract() == 0.0 && score.abs() < 1e15 {
        format!("{}", score as i64)
    } else {
        format!("{score:.2}")
    }
}

#[async_trait::async_trait]
pub trait TrendSource: Send + Sync {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>>;
    fn name(&self) -> &'static str;
    fn kind(&self) -> TrendSourceKind;
}
