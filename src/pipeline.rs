// src/pipeline.rs
//! Wires aggregator, synthesizer and content store into one run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::content::ContentDir;
use crate::synth::llm::{build_generator, DynGenerator};
use crate::synth::types::{GenerationRequest, StyleParams, SynthesizedPost};
use crate::synth::Synthesizer;
use crate::trends::types::{TrendBatch, TrendSource};
use crate::trends::{default_sources, fetch_all_trends, http_client};

/// What a run produced.
#[derive(Debug)]
pub enum Outcome {
    Written { path: PathBuf, post: SynthesizedPost },
    DryRun(SynthesizedPost),
}

pub struct Pipeline {
    sources: Vec<Box<dyn TrendSource>>,
    synthesizer: Synthesizer,
    store: ContentDir,
    style: StyleParams,
    fetch_timeout: Duration,
    max_per_source: usize,
}

impl Pipeline {
    pub fn new(
        sources: Vec<Box<dyn TrendSource>>,
        synthesizer: Synthesizer,
        store: ContentDir,
        style: StyleParams,
    ) -> Self {
        Self {
            sources,
            synthesizer,
            store,
            style,
            fetch_timeout: crate::trends::DEFAULT_FETCH_TIMEOUT,
            max_per_source: 10,
        }
    }

    pub fn with_fetch_limits(mut self, timeout: Duration, max_per_source: usize) -> Self {
        self.fetch_timeout = timeout;
        self.max_per_source = max_per_source;
        self
    }

    /// Build from config. The credential is resolved first, so a missing key
    /// fails before any network call.
    pub fn from_config(cfg: &AppConfig) -> Result<Self> {
        let settings = cfg.llm.resolve()?;
        info!(
            target: "synth",
            provider = ?settings.provider,
            model = %settings.model,
            key_len = settings.api_key.len(),
            "llm settings resolved"
        );
        let generator: DynGenerator = build_generator(&settings)?;
        let client = http_client(&cfg.sources.user_agent)?;

        Ok(Self::new(
            default_sources(&cfg.sources, client),
            Synthesizer::new(generator),
            ContentDir::new(&cfg.content_dir),
            cfg.style.clone(),
        )
        .with_fetch_limits(cfg.sources.timeout(), cfg.sources.max_per_source))
    }

    pub async fn fetch_trends(&self) -> TrendBatch {
        fetch_all_trends(&self.sources, self.fetch_timeout, self.max_per_source).await
    }

    /// Aggregate, synthesize, then persist (unless `dry_run`). Any error after
    /// aggregation aborts the run with nothing written.
    pub async fn run(&self, topic: String, dry_run: bool) -> Result<Outcome> {
        info!(target: "synth", %topic, dry_run, "starting run");
        let trends = self.fetch_trends().await;
        if trends.is_empty() {
            tracing::warn!(target: "trends", "no trend records from any source, using evergreen prompt");
        }

        let request = GenerationRequest {
            topic,
            trends,
            style: self.style.clone(),
        };
        let post = self.synthesizer.synthesize(request).await?;

        if dry_run {
            return Ok(Outcome::DryRun(post));
        }
        let path = self.store.write_post(&post)?;
        Ok(Outcome::Written { path, post })
    }
}
