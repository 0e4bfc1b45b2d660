// tests/trends_partial_failure.rs
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use blog_autodraft::fetch_all_trends;
use blog_autodraft::synth::prompt::{build_prompt, NO_TRENDS_PLACEHOLDER};
use blog_autodraft::synth::types::{GenerationRequest, StyleParams};
use blog_autodraft::trends::types::{TrendRecord, TrendSource, TrendSourceKind};
use chrono::{NaiveDate, Utc};

const NAMES: [&str; 3] = ["alpha", "beta", "gamma"];

struct MockSource {
    name: &'static str,
    fail: bool,
    delay: Duration,
}

#[async_trait]
impl TrendSource for MockSource {
    async fn fetch_latest(&self) -> Result<Vec<TrendRecord>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(anyhow!("{} is down", self.name));
        }
        Ok((0..2)
            .map(|i| TrendRecord {
                source: TrendSourceKind::ForumPost,
                title: format!("{} item {}", self.name, i),
                url: format!("https://{}.test/{}", self.name, i),
                score: (10 - i) as f64,
                fetched_at: Utc::now(),
            })
            .collect())
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn kind(&self) -> TrendSourceKind {
        TrendSourceKind::ForumPost
    }
}

fn sources(fail_mask: u8) -> Vec<Box<dyn TrendSource>> {
    NAMES
        .iter()
        .enumerate()
        .map(|(i, &name)| {
            Box::new(MockSource {
                name,
                fail: fail_mask & (1 << i) != 0,
                delay: Duration::ZERO,
            }) as Box<dyn TrendSource>
        })
        .collect()
}

#[tokio::test]
async fn every_failure_subset_keeps_the_rest() {
    for mask in 0u8..8 {
        let batch = fetch_all_trends(&sources(mask), Duration::from_secs(5), 10).await;
        assert_eq!(batch.groups.len(), 3, "mask {mask:03b}");

        let expected: Vec<&str> = NAMES
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) == 0)
            .map(|(_, n)| *n)
            .collect();
        assert_eq!(batch.populated_sources(), expected, "mask {mask:03b}");

        for (i, g) in batch.groups.iter().enumerate() {
            assert_eq!(g.name, NAMES[i]);
            let failed = mask & (1 << i) != 0;
            assert_eq!(g.failed(), failed);
            assert_eq!(g.records.len(), if failed { 0 } else { 2 });
        }
    }
}

#[tokio::test]
async fn all_sources_failing_still_yields_a_prompt() {
    let batch = fetch_all_trends(&sources(0b111), Duration::from_secs(5), 10).await;
    assert!(batch.is_empty());
    assert_eq!(batch.groups.len(), 3);

    let prompt = build_prompt(
        &GenerationRequest {
            topic: "Laravel Performance Tips".into(),
            trends: batch,
            style: StyleParams::default(),
        },
        NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
    );
    assert!(prompt.contains(NO_TRENDS_PLACEHOLDER));
    assert!(prompt.contains("Laravel Performance Tips"));
}

#[tokio::test]
async fn slow_source_times_out_alone_and_order_is_kept() {
    let sources: Vec<Box<dyn TrendSource>> = vec![
        Box::new(MockSource {
            name: "slow",
            fail: false,
            delay: Duration::from_secs(30),
        }),
        Box::new(MockSource {
            name: "fast",
            fail: false,
            delay: Duration::from_millis(10),
        }),
    ];
    let started = std::time::Instant::now();
    let batch = fetch_all_trends(&sources, Duration::from_millis(200), 10).await;
    assert!(started.elapsed() < Duration::from_secs(5));

    assert_eq!(batch.groups[0].name, "slow");
    assert!(batch.groups[0].records.is_empty());
    assert!(batch.groups[0].error.as_deref().unwrap().contains("timed out"));
    assert_eq!(batch.groups[1].name, "fast");
    assert_eq!(batch.groups[1].records[0].title, "fast item 0");
    assert_eq!(batch.groups[1].records[1].title, "fast item 1");
}
