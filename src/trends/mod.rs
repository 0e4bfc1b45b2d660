// src/trends/mod.rs
pub mod providers;
pub mod types;

use std::time::{Duration, Instant};

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::OnceCell;

use crate::config::SourcesConfig;
use crate::trends::providers::{
    devto::DevToProvider, github::GitHubTrendingProvider, hackernews::HackerNewsProvider,
    rss::RssFeedProvider,
};
use crate::trends::types::{SourceGroup, TrendBatch, TrendRecord, TrendSource};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(12);
const TITLE_MAX_CHARS: usize = 300;

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("trends_records_total", "Trend records kept after normalization.");
        describe_counter!(
            "trends_source_errors_total",
            "Trend source fetch/parse/timeout errors."
        );
        describe_histogram!("trends_fetch_ms", "Per-source fetch time in milliseconds.");
    });
}

fn ascii_quote(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' | '\u{00AB}' | '\u{00BB}' => '"',
        '\u{2018}' | '\u{2019}' => '\'',
        c => c,
    }
}

/// Clean a trend title for the prompt.
///
/// Markup is removed before entities are decoded, so an escaped `&lt;T&gt;`
/// survives as text. Typographic quotes fold to ASCII, whitespace runs become
/// one space, and the result is capped at `TITLE_MAX_CHARS`.
pub fn normalize_title(s: &str) -> String {
    static MARKUP: OnceCell<regex::Regex> = OnceCell::new();
    let markup = MARKUP.get_or_init(|| regex::Regex::new(r"</?[A-Za-z][^>]*>").unwrap());

    let without_markup = markup.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&without_markup);

    let mut out = String::with_capacity(decoded.len());
    for word in decoded.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().map(ascii_quote));
    }
    if let Some((cut, _)) = out.char_indices().nth(TITLE_MAX_CHARS) {
        out.truncate(cut);
    }
    out
}

/// Normalize titles, drop empty ones, cap the group size. Source order is kept.
pub fn normalize_records(raw: Vec<TrendRecord>, max_per_source: usize) -> Vec<TrendRecord> {
    raw.into_iter()
        .filter_map(|mut r| {
            r.title = normalize_title(&r.title);
            (!r.title.is_empty()).then_some(r)
        })
        .take(max_per_source)
        .collect()
}

/// Fetch every source concurrently. Each source gets at most `timeout`; a
/// source that errors or times out becomes an empty group. Never fails.
pub async fn fetch_all_trends(
    sources: &[Box<dyn TrendSource>],
    timeout: Duration,
    max_per_source: usize,
) -> TrendBatch {
    ensure_metrics_described();

    let fetches = sources.iter().map(|s| async move {
        let t0 = Instant::now();
        let res = tokio::time::timeout(timeout, s.fetch_latest()).await;
        histogram!("trends_fetch_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let mut group = SourceGroup::empty(s.name(), s.kind());
        match res {
            Ok(Ok(raw)) => {
                group.records = normalize_records(raw, max_per_source);
                counter!("trends_records_total").increment(group.records.len() as u64);
                tracing::debug!(
                    target: "trends",
                    source = s.name(),
                    records = group.records.len(),
                    "source fetched"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(target: "trends", error = ?e, source = s.name(), "source error");
                counter!("trends_source_errors_total").increment(1);
                group.error = Some(format!("{e:#}"));
            }
            Err(_) => {
                tracing::warn!(
                    target: "trends",
                    source = s.name(),
                    timeout_ms = timeout.as_millis() as u64,
                    "source timed out"
                );
                counter!("trends_source_errors_total").increment(1);
                group.error = Some(format!("timed out after {}ms", timeout.as_millis()));
            }
        }
        group
    });

    // join_all preserves input order, so groups follow registration order.
    let batch = TrendBatch::new(join_all(fetches).await);

    tracing::info!(
        target: "trends",
        sources = batch.groups.len(),
        populated = batch.populated_sources().len(),
        records = batch.total_records(),
        "trend aggregation finished"
    );
    batch
}

/// Build the source registry in its fixed order: github, hackernews, devto,
/// then configured RSS feeds.
pub fn default_sources(cfg: &SourcesConfig, client: reqwest::Client) -> Vec<Box<dyn TrendSource>> {
    let mut out: Vec<Box<dyn TrendSource>> = Vec::new();
    if cfg.github {
        out.push(Box::new(GitHubTrendingProvider::from_url(
            GitHubTrendingProvider::default_url(chrono::Utc::now().date_naive(), cfg.max_per_source),
            client.clone(),
        )));
    }
    if cfg.hackernews {
        out.push(Box::new(HackerNewsProvider::from_url(
            HackerNewsProvider::default_url(cfg.max_per_source),
            client.clone(),
        )));
    }
    if cfg.devto {
        out.push(Box::new(DevToProvider::from_url(
            DevToProvider::default_url(cfg.max_per_source),
            client.clone(),
        )));
    }
    for url in &cfg.rss_feeds {
        out.push(Box::new(RssFeedProvider::from_url(url.clone(), client.clone())));
    }
    out
}

/// HTTP client shared by all sources.
pub fn http_client(user_agent: &str) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(4))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::types::TrendSourceKind;
    use chrono::Utc;

    #[test]
    fn normalize_title_strips_tags_and_entities() {
        let out = normalize_title("  <b>Rust&nbsp;&nbsp;1.90</b> &ldquo;released&rdquo;  ");
        assert_eq!(out, r#"Rust 1.90 "released""#);
    }

    #[test]
    fn normalize_title_keeps_escaped_angle_brackets() {
        assert_eq!(normalize_title("Why Vec&lt;T&gt; is&nbsp;fast"), "Why Vec<T> is fast");
        assert_eq!(normalize_title("line<br>break"), "line break");
        assert_eq!(normalize_title("a < b"), "a < b");
    }

    #[test]
    fn normalize_title_caps_length_on_char_boundary() {
        let long = "é".repeat(TITLE_MAX_CHARS + 20);
        assert_eq!(normalize_title(&long).chars().count(), TITLE_MAX_CHARS);
    }

    #[test]
    fn normalize_records_drops_empty_and_caps() {
        let mk = |t: &str| TrendRecord {
            source: TrendSourceKind::Article,
            title: t.into(),
            url: "u".into(),
            score: 1.0,
            fetched_at: Utc::now(),
        };
        let out = normalize_records(vec![mk("<p></p>"), mk("a"), mk("b"), mk("c")], 2);
        let titles: Vec<_> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);
    }

    #[test]
    fn default_sources_follow_registration_order() {
        let cfg = SourcesConfig {
            rss_feeds: vec!["https://blog.example.test/rss.xml".into()],
            ..SourcesConfig::default()
        };
        let sources = default_sources(&cfg, reqwest::Client::new());
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["github", "hackernews", "devto", "rss"]);
    }
}
