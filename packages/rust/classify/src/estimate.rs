//! Cost preview for a classification run.
//!
//! Prompt tokens are counted with the model's BPE encoding; output tokens use
//! a fixed per-call average, so the total is a sanity check before paid calls
//! rather than a billing statement.

use asrskit_shared::{AsrsError, PricingConfig, Result};
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

use crate::prompt;

/// Counts prompt tokens with the encoding used by a given model.
pub struct TokenCounter {
    bpe: CoreBPE,
}

impl TokenCounter {
    /// Pick the encoding for `model`.
    ///
    /// o3/o4 models use `o200k_base`. Other names are looked up in the
    /// tokenizer tables and fall back to `o200k_base` when unknown.
    pub fn for_model(model: &str) -> Result<Self> {
        let bpe = if model.starts_with("o3") || model.starts_with("o4") {
            o200k()?
        } else {
            match tiktoken_rs::get_bpe_from_model(model) {
                Ok(bpe) => bpe,
                Err(e) => {
                    warn!(model, error = %e, "no tokenizer for model, falling back to o200k_base");
                    o200k()?
                }
            }
        };
        debug!(model, "tokenizer ready");
        Ok(Self { bpe })
    }

    pub fn count(&self, text: &str) -> u64 {
        self.bpe.encode_ordinary(text).len() as u64
    }
}

fn o200k() -> Result<CoreBPE> {
    tiktoken_rs::o200k_base()
        .map_err(|e| AsrsError::config(format!("failed to load o200k_base encoding: {e}")))
}

/// Projected usage and cost for a set of narratives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostEstimate {
    /// Narratives that will go through the service (blank ones are free).
    pub calls: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
}

/// Cost in USD of the given token counts.
pub fn cost_of(input_tokens: u64, output_tokens: u64, pricing: &PricingConfig) -> f64 {
    let input = input_tokens as f64 / 1_000_000.0 * pricing.input_per_million;
    let output = output_tokens as f64 / 1_000_000.0 * pricing.output_per_million;
    input + output
}

/// Estimate usage for classifying each narrative once.
pub fn estimate_cost<'a>(
    narratives: impl IntoIterator<Item = &'a str>,
    counter: &TokenCounter,
    pricing: &PricingConfig,
) -> CostEstimate {
    let mut estimate = CostEstimate::default();

    for narrative in narratives {
        if narrative.trim().is_empty() {
            continue;
        }
        estimate.calls += 1;
        estimate.input_tokens += counter.count(&prompt::render(narrative));
        estimate.output_tokens += pricing.avg_output_tokens;
    }

    estimate.total_cost = cost_of(estimate.input_tokens, estimate.output_tokens, pricing);
    estimate
}
