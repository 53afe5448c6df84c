//! Advisory cost estimation for upstream API calls.
//!
//! Token counts come from the model's own BPE vocabulary via tiktoken, so the
//! estimate tracks what the provider meters. The numbers are advisory, not
//! billing-accurate: image tokens are not counted, only the prompt and caption text.

use rust_decimal::Decimal;
use tiktoken_rs::CoreBPE;

use crate::config::PricingConfig;
use crate::error::{ReportError, Result};

/// Estimates the monetary cost of one prompt/response pair.
pub struct CostEstimator {
    bpe: CoreBPE,
    input_per_1k: Decimal,
    output_per_1k: Decimal,
}

impl CostEstimator {
    /// Resolve the tokenizer for `model` and bind it to the configured rates.
    ///
    /// An unknown model is a configuration error: silently estimating with the
    /// wrong vocabulary would produce meaningless numbers.
    pub fn for_model(model: &str, pricing: &PricingConfig) -> Result<Self> {
        let bpe = tiktoken_rs::get_bpe_from_model(model).map_err(|e| {
            ReportError::Config(format!("no tokenizer available for model '{}': {}", model, e))
        })?;

        Ok(Self {
            bpe,
            input_per_1k: pricing.input_per_1k,
            output_per_1k: pricing.output_per_1k,
        })
    }

    /// Estimated cost of one call, rounded to 6 decimal places.
    ///
    /// `in_tokens * input_rate/1K + out_tokens * output_rate/1K`.
    pub fn estimate(&self, prompt: &str, response: &str) -> Decimal {
        let in_tokens = self.count_tokens(prompt);
        let out_tokens = self.count_tokens(response);

        let per_1k = Decimal::from(1000u32);
        let cost = Decimal::from(in_tokens) * self.input_per_1k / per_1k
            + Decimal::from(out_tokens) * self.output_per_1k / per_1k;
        cost.round_dp(6)
    }

    fn count_tokens(&self, text: &str) -> u64 {
        self.bpe.encode_with_special_tokens(text).len() as u64
    }
}

/// Running accumulator of estimated cost for one batch run.
///
/// Add-only for the duration of a run; a fresh ledger is created per run.
#[derive(Debug, Clone, Default)]
pub struct CostLedger {
    total: Decimal,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one call's estimate to the running total.
    pub fn add(&mut self, cost: Decimal) {
        debug_assert!(cost >= Decimal::ZERO);
        self.total += cost;
    }

    /// Current total, rounded to 6 decimal places.
    pub fn total(&self) -> Decimal {
        self.total.round_dp(6)
    }
}
