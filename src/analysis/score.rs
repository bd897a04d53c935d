//! Composite score
//!
//! Folds the short- and long-context fits into one number:
//! `(prompt_tps · completion_tps · 1000/ttft_ms)^(1/3) · scale`, where the
//! time to first token is estimated for a reference prompt length.

use super::regression::ModelFit;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean prompt length of the reference workload:
/// (1024 + 4096 + 2048 + 2048 + 1024 + 1280 + 384 + 64 + 16) / 9
pub const REFERENCE_AVG_PROMPT_TOKENS: f64 = 1331.56;

/// Multiplier applied to the geometric mean
pub const SCORE_SCALING_FACTOR: f64 = 10.0;

/// Score calculation constants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreConfig {
    /// Reference prompt length used to estimate time to first token
    pub avg_prompt_tokens: f64,
    /// Final multiplier
    pub scaling_factor: f64,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            avg_prompt_tokens: REFERENCE_AVG_PROMPT_TOKENS,
            scaling_factor: SCORE_SCALING_FACTOR,
        }
    }
}

/// Computes the composite score from per-context fits
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoreConfig,
}

impl ScoreCalculator {
    /// Create a calculator with explicit constants
    pub fn new(config: ScoreConfig) -> Self {
        Self { config }
    }

    /// Score the given fits, or `None` when no fit has usable rates
    ///
    /// Fits with a non-positive prompt or completion rate are skipped; the
    /// remaining throughputs are averaged before scoring. The result is
    /// rounded to two decimals.
    pub fn score(&self, fits: &[Option<ModelFit>]) -> Option<f64> {
        let mut prompt_tps = 0.0;
        let mut completion_tps = 0.0;
        let mut contributing = 0usize;

        for fit in fits.iter().flatten() {
            if fit.prompt_rate > 0.0 && fit.completion_rate > 0.0 {
                prompt_tps += 1000.0 / fit.prompt_rate;
                completion_tps += 1000.0 / fit.completion_rate;
                contributing += 1;
            }
        }

        if contributing == 0 {
            debug!("No usable fits for composite score");
            return None;
        }

        prompt_tps /= contributing as f64;
        completion_tps /= contributing as f64;

        let ttft_ms = self.config.avg_prompt_tokens / prompt_tps * 1000.0;
        let score =
            (prompt_tps * completion_tps * (1000.0 / ttft_ms)).cbrt() * self.config.scaling_factor;
        let rounded = (score * 100.0).round() / 100.0;

        debug!(
            contributing,
            prompt_tps,
            completion_tps,
            ttft_ms,
            score = rounded,
            "Composite score"
        );

        Some(rounded)
    }
}
