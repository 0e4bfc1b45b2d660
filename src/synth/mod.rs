// src/synth/mod.rs
//! Post synthesis: prompt assembly, one generator call, response validation.

pub mod frontmatter;
pub mod llm;
pub mod prompt;
pub mod slug;
pub mod types;

use chrono::NaiveDate;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::error::GenerationError;
use crate::synth::llm::DynGenerator;
use crate::synth::types::{GeneratedPost, GenerationRequest, SynthesizedPost};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("synth_requests_total", "Generator calls issued.");
        describe_counter!(
            "synth_failures_total",
            "Runs that failed in the generator or while validating its output."
        );
    });
}

/// `{date}-{slug}.md`
pub fn post_filename(post: &GeneratedPost) -> String {
    format!(
        "{}-{}.md",
        post.date.format("%Y-%m-%d"),
        slug::slugify(&post.title)
    )
}

pub struct Synthesizer {
    generator: DynGenerator,
    today: Option<NaiveDate>,
}

impl Synthesizer {
    pub fn new(generator: DynGenerator) -> Self {
        Self {
            generator,
            today: None,
        }
    }

    /// Pin the date the prompt asks for (defaults to today, UTC).
    pub fn with_date(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub async fn synthesize(
        &self,
        request: GenerationRequest,
    ) -> Result<SynthesizedPost, GenerationError> {
        ensure_metrics_described();

        let today = self.today.unwrap_or_else(|| chrono::Utc::now().date_naive());
        let prompt = prompt::build_prompt(&request, today);
        tracing::info!(
            target: "synth",
            provider = self.generator.name(),
            topic = %request.topic,
            trend_records = request.trends.total_records(),
            prompt_chars = prompt.chars().count(),
            "requesting generated post"
        );

        counter!("synth_requests_total").increment(1);
        let result = self
            .generator
            .generate(&prompt)
            .await
            .and_then(|raw| frontmatter::parse_post(&raw, &request.topic));

        let post = match result {
            Ok(p) => p,
            Err(e) => {
                counter!("synth_failures_total").increment(1);
                tracing::error!(target: "synth", error = %e, "synthesis failed");
                return Err(e);
            }
        };

        let filename = post_filename(&post);
        tracing::info!(
            target: "synth",
            %filename,
            title = %post.title,
            tags = post.tags.len(),
            "post synthesized"
        );
        Ok(SynthesizedPost { post, filename })
    }
}
