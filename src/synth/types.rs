// src/synth/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::trends::types::TrendBatch;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StyleParams {
    pub tone: String,
    pub use_emojis: bool,
    pub target_word_count: u32,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            tone: "conversational, practical and a little opinionated".to_string(),
            use_emojis: true,
            target_word_count: 1200,
        }
    }
}

/// Input for one synthesis run. Consumed by value.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub topic: String,
    pub trends: TrendBatch,
    pub style: StyleParams,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GeneratedPost {
    pub title: String,
    pub date: NaiveDate,
    pub excerpt: String,
    /// Deduplicated, first-seen order.
    pub tags: Vec<String>,
    pub featured: bool,
    pub body: String,
}

impl GeneratedPost {
    /// Render the post as a content file. Output is a pure function of the
    /// fields.
    pub fn to_markdown(&self) -> String {
        let tags = self
            .tags
            .iter()
            .map(|t| quote(t))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "---\ntitle: {}\ndate: {}\nexcerpt: {}\ntags: [{}]\nfeatured: {}\n---\n\n{}\n",
            quote(&self.title),
            quote(&self.date.format("%Y-%m-%d").to_string()),
            quote(&self.excerpt),
            tags,
            self.featured,
            self.body.trim_end()
        )
    }
}

/// Double-quoted scalar that stays on one line. Control characters are
/// escaped so the frontmatter parser reads back the exact string.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A validated post plus the filename it should be stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedPost {
    pub post: GeneratedPost,
    pub filename: String,
}
