//! HFACS batch classification of extracted incident records.
//!
//! This crate provides:
//! - [`CompletionBackend`] and [`OpenAiClient`] — the remote inference seam
//! - [`classify_narrative`] — one narrative → taxonomy entries or an inline error
//! - [`find_narrative_field`] / [`narrative_text`] — narrative resolution
//! - [`ClassificationJob`] — resumable, checkpointed batch runs
//! - [`estimate_cost`] — cost preview before paid calls

pub mod classifier;
pub mod client;
pub mod estimate;
pub mod job;
pub mod narrative;
pub mod parse;
pub mod prompt;
pub mod store;
pub mod taxonomy;

pub use classifier::{ClassifyOutcome, classify_narrative};
pub use client::{Completion, CompletionBackend, OpenAiClient};
pub use estimate::{CostEstimate, TokenCounter, cost_of, estimate_cost};
pub use job::{
    ClassificationJob, JobOptions, JobProgress, JobReport, SilentJobProgress, resolve_range,
};
pub use narrative::{PREFERRED_NARRATIVE_FIELD, find_narrative_field, narrative_text};
pub use parse::{parse_classification, strip_code_fence};
pub use store::{JsonRecord, load_records, save_records};
pub use taxonomy::{ClassificationItem, ErrorDescriptor, TaxonomyEntry};
