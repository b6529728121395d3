//! Resumable batch classification.
//!
//! A job walks a cursor over `[start, end)` of the input records, classifies
//! each narrative, and merges the result into a master copy that is
//! checkpointed to the output file. Re-running over overlapping or disjoint
//! ranges updates records in place, matched by identifier.

use std::collections::HashMap;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use asrskit_shared::{AsrsError, CLASSIFICATION_KEY, IDENTIFIER_KEY, Result};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::classifier::classify_narrative;
use crate::client::CompletionBackend;
use crate::narrative::narrative_text;
use crate::store::{JsonRecord, load_records, save_records};

/// Settings for one job run.
#[derive(Debug, Clone)]
pub struct JobOptions {
    /// Section holding the narrative to classify.
    pub narrative_field: String,
    /// First input index to process (0-based).
    pub start: usize,
    /// Exclusive end index; `None` means the end of the input.
    pub end: Option<usize>,
    /// Save after this many processed records (and always at the end).
    pub checkpoint_every: usize,
    /// Pause between consecutive service calls.
    pub request_delay: Duration,
}

/// Summary of a finished job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Input indices covered by the run.
    pub range: Range<usize>,
    /// Records whose classification was (re)written.
    pub processed: usize,
    /// Records that went through the service.
    pub classified: usize,
    /// Records with a blank narrative, given an empty classification.
    pub empty: usize,
    /// Records that could not be found in the master data.
    pub skipped: usize,
    /// Records whose classification is an error descriptor.
    pub errors: usize,
    /// Number of times the output file was written.
    pub checkpoints: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Progress callback for job runs.
pub trait JobProgress: Send + Sync {
    /// Called once the range is known.
    fn started(&self, total: usize);
    /// Called after each record in the range, including skipped ones.
    fn record_done(&self, id: &str, current: usize, total: usize);
    /// Called after each write of the output file.
    fn checkpoint(&self, records: usize);
}

/// No-op job progress.
pub struct SilentJobProgress;

impl JobProgress for SilentJobProgress {
    fn started(&self, _total: usize) {}
    fn record_done(&self, _id: &str, _current: usize, _total: usize) {}
    fn checkpoint(&self, _records: usize) {}
}

/// Validate a requested range against `total` input records.
///
/// A start past the end is an error; an empty, inverted, or oversized end is
/// clamped to `total` with a warning.
pub fn resolve_range(total: usize, start: usize, end: Option<usize>) -> Result<Range<usize>> {
    if start >= total {
        return Err(AsrsError::validation(format!(
            "start index {start} is out of bounds (0-{})",
            total.saturating_sub(1)
        )));
    }

    let end = match end {
        None => total,
        Some(end) if end <= start || end > total => {
            warn!(end, start, total, "end index is invalid, processing to the end of the input");
            total
        }
        Some(end) => end,
    };

    Ok(start..end)
}

/// How input records are matched to records in the master data.
enum MasterIndex {
    ByIdentifier(HashMap<String, usize>),
    Positional,
}

impl MasterIndex {
    /// Key by identifier only when every record has a unique one.
    fn build(master: &[JsonRecord]) -> Self {
        let mut map = HashMap::with_capacity(master.len());
        for (idx, record) in master.iter().enumerate() {
            let Some(id) = record_id(record) else {
                warn!("not every record has an identifier, matching by list position");
                return Self::Positional;
            };
            if map.insert(id.to_string(), idx).is_some() {
                warn!(id, "duplicate identifier, matching by list position");
                return Self::Positional;
            }
        }
        Self::ByIdentifier(map)
    }

    fn locate(&self, input_idx: usize, input: &JsonRecord, master_len: usize) -> Option<usize> {
        match self {
            Self::ByIdentifier(map) => record_id(input).and_then(|id| map.get(id).copied()),
            Self::Positional => (input_idx < master_len).then_some(input_idx),
        }
    }
}

fn record_id(record: &JsonRecord) -> Option<&str> {
    record.get(IDENTIFIER_KEY).and_then(Value::as_str)
}

/// A resumable classification run writing to `output_path`.
pub struct ClassificationJob<'a, B> {
    backend: &'a B,
    options: JobOptions,
    output_path: PathBuf,
}

impl<'a, B: CompletionBackend> ClassificationJob<'a, B> {
    pub fn new(backend: &'a B, options: JobOptions, output_path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            options,
            output_path: output_path.into(),
        }
    }

    /// Load the existing output file, or seed the master data from `input`.
    fn load_master(&self, input: &[JsonRecord]) -> Result<Vec<JsonRecord>> {
        if self.output_path.exists() {
            info!(path = %self.output_path.display(), "resuming from existing output");
            load_records(&self.output_path)
        } else {
            info!(path = %self.output_path.display(), "output not found, a new file will be created");
            Ok(input.to_vec())
        }
    }

    /// Classify `input[start..end]` and merge results into the output file.
    #[instrument(skip_all, fields(output = %self.output_path.display(), field = %self.options.narrative_field))]
    pub async fn run(&self, input: &[JsonRecord], progress: &dyn JobProgress) -> Result<JobReport> {
        let range = resolve_range(input.len(), self.options.start, self.options.end)?;
        let total = range.len();
        let every = self.options.checkpoint_every.max(1);

        let mut master = self.load_master(input)?;
        let index = MasterIndex::build(&master);

        let mut report = JobReport {
            range: range.clone(),
            ..JobReport::default()
        };

        info!(start = range.start, end = range.end, total, "starting classification job");
        progress.started(total);

        for (pos, input_idx) in range.clone().enumerate() {
            let current = pos + 1;
            let record = &input[input_idx];
            let label = record_id(record)
                .map(str::to_string)
                .unwrap_or_else(|| format!("original_index_{input_idx}"));

            match index.locate(input_idx, record, master.len()) {
                Some(master_idx) => {
                    let target = &mut master[master_idx];
                    let narrative = narrative_text(target, &self.options.narrative_field);
                    let outcome = classify_narrative(self.backend, &narrative).await;

                    if outcome.called {
                        report.classified += 1;
                    } else {
                        warn!(id = %label, field = %self.options.narrative_field, "no narrative, adding empty classification");
                        report.empty += 1;
                    }
                    if outcome.is_error() {
                        report.errors += 1;
                    }
                    report.processed += 1;
                    report.input_tokens += outcome.input_tokens;
                    report.output_tokens += outcome.output_tokens;

                    let items = serde_json::to_value(&outcome.items)
                        .map_err(|e| AsrsError::json(&self.output_path, e))?;
                    target.insert(CLASSIFICATION_KEY.to_string(), items);
                    debug!(id = %label, entries = outcome.items.len(), "classification attached");

                    if outcome.called && current < total && !self.options.request_delay.is_zero() {
                        tokio::time::sleep(self.options.request_delay).await;
                    }
                }
                None => {
                    warn!(id = %label, index = input_idx, "record not found in output data, skipping");
                    report.skipped += 1;
                }
            }

            progress.record_done(&label, current, total);

            if current % every == 0 || current == total {
                save_records(&self.output_path, &master)?;
                report.checkpoints += 1;
                progress.checkpoint(master.len());
            }
        }

        info!(
            processed = report.processed,
            classified = report.classified,
            empty = report.empty,
            skipped = report.skipped,
            errors = report.errors,
            input_tokens = report.input_tokens,
            output_tokens = report.output_tokens,
            "classification job complete"
        );

        Ok(report)
    }
}
