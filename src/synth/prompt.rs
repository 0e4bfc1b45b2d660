// src/synth/prompt.rs
use chrono::NaiveDate;

use crate::synth::types::GenerationRequest;

pub const NO_TRENDS_PLACEHOLDER: &str = "No current trends available";

/// Build the single user prompt for a run. Deterministic for a given request
/// and date.
pub fn build_prompt(req: &GenerationRequest, today: NaiveDate) -> String {
    let style = &req.style;
    let date = today.format("%Y-%m-%d");

    let trends = req.trends.to_prompt_text();
    let trends_section = if trends.is_empty() {
        format!(
            "{NO_TRENDS_PLACEHOLDER}. Write an evergreen treatment of the topic instead of \
             referencing current events."
        )
    } else {
        format!(
            "Here is what developers are talking about right now, grouped by source. Scores only \
             compare items within the same source.\n\n{trends}\nWeave one or two of these in \
             where they genuinely relate to the topic; ignore the rest."
        )
    };

    let emoji_rule = if style.use_emojis {
        "Use a few emojis in headings or key points, but don't overdo it."
    } else {
        "Do not use any emojis."
    };

    format!(
        r#"You are a conversational tech blogger writing for working developers. Write like a person talking to a colleague: direct, friendly, concrete, with real code examples where they help.

TOPIC: {topic}

CURRENT TRENDS:
{trends_section}

REQUIREMENTS:
- Length: about {words} words.
- Tone: {tone}.
- {emoji_rule}
- Use Markdown headings (##, ###), short paragraphs, lists and fenced code blocks.
- Do not include the title as a heading in the body.

OUTPUT FORMAT:
Start your reply with a frontmatter block delimited by lines containing only ---, then the post body. Use exactly these fields:

---
title: "A catchy, specific title"
date: "{date}"
excerpt: "One or two sentences summarizing the post"
tags: ["tag1", "tag2", "tag3"]
featured: false
---

Rules for the frontmatter:
- title: a quoted string.
- date: exactly {date}.
- excerpt: a quoted string, under 160 characters.
- tags: an inline list of 3 to 5 lowercase quoted strings.
- featured: true or false, unquoted.

Output only the frontmatter and the Markdown body, nothing else."#,
        topic = req.topic,
        words = style.target_word_count,
        tone = style.tone,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::types::StyleParams;
    use crate::trends::types::{SourceGroup, TrendBatch, TrendRecord, TrendSourceKind};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap()
    }

    fn request(trends: TrendBatch, use_emojis: bool) -> GenerationRequest {
        GenerationRequest {
            topic: "Laravel Performance Tips".into(),
            trends,
            style: StyleParams {
                tone: "casual".into(),
                use_emojis,
                target_word_count: 900,
            },
        }
    }

    #[test]
    fn empty_batch_uses_placeholder() {
        let batch = TrendBatch::new(vec![
            SourceGroup::empty("github", TrendSourceKind::RepoTrend),
            SourceGroup::empty("hackernews", TrendSourceKind::ForumPost),
        ]);
        let p = build_prompt(&request(batch, false), day());
        assert!(p.contains(NO_TRENDS_PLACEHOLDER));
        assert!(p.contains("Do not use any emojis."));
        assert!(p.contains("TOPIC: Laravel Performance Tips"));
        assert!(p.contains("about 900 words"));
        assert!(p.contains("date: \"2026-02-01\""));
        for field in ["title:", "date:", "excerpt:", "tags:", "featured:"] {
            assert!(p.contains(field), "prompt lacks {field}");
        }
    }

    #[test]
    fn trends_are_embedded() {
        let batch = TrendBatch::new(vec![SourceGroup {
            name: "devto".into(),
            kind: TrendSourceKind::Article,
            records: vec![TrendRecord {
                source: TrendSourceKind::Article,
                title: "Octane in production".into(),
                url: "https://dev.to/x/octane".into(),
                score: 88.0,
                fetched_at: chrono::Utc::now(),
            }],
            error: None,
        }]);
        let p = build_prompt(&request(batch, true), day());
        assert!(!p.contains(NO_TRENDS_PLACEHOLDER));
        assert!(p.contains("source: devto (article)"));
        assert!(p.contains("Octane in production"));
        assert!(p.contains("Use a few emojis"));
    }
}
