// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod content;
pub mod error;
pub mod pipeline;
pub mod synth;
pub mod trends;

// ---- Re-exports for stable public API ----
pub use crate::error::{ConfigError, GenerationError, PersistenceError};
pub use crate::pipeline::{Outcome, Pipeline};
pub use crate::synth::slug::slugify;
pub use crate::synth::Synthesizer;
pub use crate::trends::fetch_all_trends;
