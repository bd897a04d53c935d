//! Result rendering
//!
//! Three stdout formats plus the plain-text body of the results log. All
//! rates are reported as tokens/sec rounded to two decimals.

pub mod csv;
pub mod json;
pub mod text;

use clap::ValueEnum;

use crate::analysis::{tokens_per_sec, ModelFit};
use crate::benchmarks::MatrixResult;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// JSON array, one record per parameter combination
    Json,
    /// Coloured human-readable report
    #[default]
    Text,
    /// One CSV row per successful combination
    Csv,
}

/// Render results in the requested format
pub fn render(
    results: &[MatrixResult],
    format: OutputFormat,
    include_score: bool,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => json::render(results, include_score),
        OutputFormat::Text => Ok(text::render(results, include_score, true)),
        OutputFormat::Csv => Ok(csv::render(results, include_score)),
    }
}

/// Round to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Rounded throughput figures of one fit
///
/// A rate that cannot be converted reports as `None`; missing fits report
/// all zeros through [`ContextMetrics::or_zero`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextMetrics {
    pub prompt_tokens_per_sec: Option<f64>,
    pub cached_prompt_tokens_per_sec: Option<f64>,
    pub completion_tokens_per_sec: Option<f64>,
    pub r_squared: f64,
}

impl ContextMetrics {
    pub fn from_fit(fit: &ModelFit) -> Self {
        Self {
            prompt_tokens_per_sec: tokens_per_sec(fit.prompt_rate).map(round2),
            cached_prompt_tokens_per_sec: tokens_per_sec(fit.cached_prompt_rate).map(round2),
            completion_tokens_per_sec: tokens_per_sec(fit.completion_rate).map(round2),
            r_squared: round2(fit.r_squared),
        }
    }

    pub fn of(fit: Option<&ModelFit>) -> Self {
        fit.map(Self::from_fit).unwrap_or_default()
    }

    /// The four figures in column order, absent rates as zero
    pub fn or_zero(&self) -> [f64; 4] {
        [
            self.prompt_tokens_per_sec.unwrap_or(0.0),
            self.cached_prompt_tokens_per_sec.unwrap_or(0.0),
            self.completion_tokens_per_sec.unwrap_or(0.0),
            self.r_squared,
        ]
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::analysis::ModelFit;
    use crate::benchmarks::{ContextObservation, MatrixResult};
    use crate::observation::Observation;
    use crate::sampling::ContextClass;
    use std::collections::BTreeMap;
    use std::time::Duration;
    use uuid::Uuid;

    pub fn fit(prompt: f64, cached: f64, completion: f64, r_squared: f64) -> ModelFit {
        ModelFit {
            prompt_rate: prompt,
            cached_prompt_rate: cached,
            completion_rate: completion,
            r_squared,
            fallback: false,
        }
    }

    pub fn result(model: &str) -> MatrixResult {
        let params = [("model", model), ("setup_cmd", "true")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let flags: BTreeMap<String, bool> = [("model", true), ("setup_cmd", false)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let mut result = MatrixResult::new(Uuid::nil(), params, flags);
        result.short_fit = Some(fit(3.0, 0.5, 25.0, 0.995));
        result.long_fit = Some(fit(4.0, 0.8, 40.0, 0.8));
        result.score = Some(149.45);
        result.observations = vec![
            ContextObservation::new(
                ContextClass::Short,
                Observation::new(120, 0, 1, Duration::from_millis(385)),
            ),
            ContextObservation::new(
                ContextClass::Long,
                Observation::new(0, 2300, 100, Duration::from_millis(5840)),
            ),
        ];
        result
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::fit;
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(333.3333), 333.33);
        assert_eq!(round2(0.995), 1.0);
        assert_eq!(round2(-1.234), -1.23);
    }

    #[test]
    fn test_context_metrics() {
        let metrics = ContextMetrics::from_fit(&fit(3.0, 0.5, 25.0, 0.987));
        assert_eq!(metrics.prompt_tokens_per_sec, Some(333.33));
        assert_eq!(metrics.cached_prompt_tokens_per_sec, Some(2000.0));
        assert_eq!(metrics.completion_tokens_per_sec, Some(40.0));
        assert_eq!(metrics.r_squared, 0.99);

        assert_eq!(ContextMetrics::of(None).or_zero(), [0.0; 4]);
    }
}
